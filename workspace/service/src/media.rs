use std::path::{Path, PathBuf};

use image::{ImageFormat, imageops::FilterType};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ServiceError};

/// Avatars are shrunk to fit inside a square of this many pixels.
pub const AVATAR_SIZE: u32 = 125;

pub const ALLOWED_EXTENSIONS: [&str; 2] = ["jpg", "png"];

pub const EXTENSION_MESSAGE: &str = "File does not have an approved extension: jpg, png";
pub const INVALID_IMAGE_MESSAGE: &str = "The uploaded file is not a valid image.";

/// A picture as received from a multipart form.
#[derive(Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for AvatarUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarUpload")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// The extension of `file_name` as written, if it is one we accept.
pub fn allowed_extension(file_name: &str) -> Option<&str> {
    let extension = Path::new(file_name).extension()?.to_str()?;
    ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(extension))
        .then_some(extension)
}

/// Stores profile pictures under random names in one directory.
#[derive(Clone, Debug)]
pub struct MediaService {
    avatar_dir: PathBuf,
}

impl MediaService {
    pub fn new(avatar_dir: impl Into<PathBuf>) -> Self {
        Self {
            avatar_dir: avatar_dir.into(),
        }
    }

    /// Validates, shrinks and writes an avatar, returning its new file name.
    ///
    /// The previous avatar of the user is left on disk.
    #[instrument(skip(self))]
    pub async fn save_avatar(&self, upload: AvatarUpload) -> Result<String> {
        let extension = allowed_extension(&upload.file_name)
            .ok_or_else(|| ServiceError::validation("picture", EXTENSION_MESSAGE))?;
        let format = if extension.eq_ignore_ascii_case("png") {
            ImageFormat::Png
        } else {
            ImageFormat::Jpeg
        };

        let file_name = format!("{}.{}", hex::encode(rand::random::<[u8; 8]>()), extension);
        let path = self.avatar_dir.join(&file_name);
        debug!("Saving avatar {} as {}", upload.file_name, file_name);

        let dir = self.avatar_dir.clone();
        let bytes = upload.bytes;
        tokio::task::spawn_blocking(move || -> Result<()> {
            let picture = image::load_from_memory(&bytes).map_err(|e| {
                warn!("Rejected avatar upload: {}", e);
                ServiceError::validation("picture", INVALID_IMAGE_MESSAGE)
            })?;

            let picture = if picture.width() > AVATAR_SIZE || picture.height() > AVATAR_SIZE {
                picture.resize(AVATAR_SIZE, AVATAR_SIZE, FilterType::Lanczos3)
            } else {
                picture
            };
            // JPEG has no alpha channel
            let picture = match format {
                ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(picture.to_rgb8()),
                _ => picture,
            };

            std::fs::create_dir_all(&dir)?;
            picture.save_with_format(&path, format)?;
            Ok(())
        })
        .await??;

        info!("Stored avatar {}", file_name);
        Ok(file_name)
    }
}
