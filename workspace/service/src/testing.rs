//! Fixtures shared by the service tests.

use std::io::Cursor;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, RgbImage};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tempfile::TempDir;

use crate::identity::{IdentityConfig, IdentityService};
use crate::media::MediaService;
use crate::store::Store;
use crate::tokens::TokenSigner;
use crate::validation::Registration;

/// A store over a fresh, migrated in-memory database.
pub async fn setup_store() -> Store {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    Store::new(db)
}

/// An identity service with the cheapest bcrypt cost and a temporary
/// avatar directory. Keep the `TempDir` alive for as long as the service.
pub fn identity(store: &Store) -> (IdentityService, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create avatar dir");
    let config = IdentityConfig {
        bcrypt_cost: 4,
        session_ttl: Duration::from_secs(60),
        remember_ttl: Duration::from_secs(3600),
    };
    let service = IdentityService::new(
        store.clone(),
        TokenSigner::new(b"service-test-secret"),
        MediaService::new(dir.path()),
        config,
    );
    (service, dir)
}

pub fn registration(username: &str, email: &str, password: &str) -> Registration {
    Registration {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes
}
