use serde::Serialize;

/// One page of a newest-first listing. `page` is 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        Self {
            items,
            page,
            per_page,
            total,
        }
    }

    pub fn pages(&self) -> u64 {
        if self.per_page == 0 {
            0
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    pub fn prev_num(&self) -> Option<u64> {
        self.has_prev().then(|| self.page - 1)
    }

    pub fn next_num(&self) -> Option<u64> {
        self.has_next().then(|| self.page + 1)
    }

    /// Page numbers for a pagination widget; `None` marks a gap.
    ///
    /// Keeps `left_edge` pages at the start, `right_edge` at the end, and
    /// a window from `left_current` before the current page to
    /// `right_current - 1` after it.
    pub fn iter_pages(
        &self,
        left_edge: u64,
        left_current: u64,
        right_current: u64,
        right_edge: u64,
    ) -> Vec<Option<u64>> {
        let pages = self.pages();
        let mut links = Vec::new();
        let mut last = 0;
        for num in 1..=pages {
            let in_window = num + left_current + 1 > self.page && num < self.page + right_current;
            if num <= left_edge || in_window || num + right_edge > pages {
                if last + 1 != num {
                    links.push(None);
                }
                links.push(Some(num));
                last = num;
            }
        }
        links
    }

    /// The compact widget the blog views show.
    pub fn page_links(&self) -> Vec<Option<u64>> {
        self.iter_pages(1, 1, 2, 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u64, total: u64) -> Page<u64> {
        Page::new(vec![], page, 5, total)
    }

    #[test]
    fn test_counts_and_neighbours() {
        let p = page(2, 7);
        assert_eq!(p.pages(), 2);
        assert!(p.has_prev());
        assert!(!p.has_next());
        assert_eq!(p.prev_num(), Some(1));
        assert_eq!(p.next_num(), None);

        let empty = page(1, 0);
        assert_eq!(empty.pages(), 0);
        assert!(!empty.has_prev());
        assert!(!empty.has_next());
        assert!(empty.page_links().is_empty());
    }

    #[test]
    fn test_page_links_with_gaps() {
        let p = page(5, 50);
        assert_eq!(
            p.page_links(),
            vec![Some(1), None, Some(4), Some(5), Some(6), None, Some(10)]
        );
    }

    #[test]
    fn test_page_links_at_edges() {
        assert_eq!(
            page(1, 50).page_links(),
            vec![Some(1), Some(2), None, Some(10)]
        );
        assert_eq!(
            page(10, 50).page_links(),
            vec![Some(1), None, Some(9), Some(10)]
        );
        assert_eq!(page(1, 12).page_links(), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let p = Page::new(vec![1, 2], 3, 5, 12).map(|n| n * 10);
        assert_eq!(p.items, vec![10, 20]);
        assert_eq!((p.page, p.per_page, p.total), (3, 5, 12));
    }
}
