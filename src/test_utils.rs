#[cfg(test)]
pub mod test_utils {
    use crate::config::{Settings, build_app_state};
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum_test::{TestServer, TestServerConfig};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use std::collections::HashMap;
    use service::RecordingMailer;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Settings for tests: cheap hashing, a fixed secret and a private
    /// avatar directory.
    pub fn test_settings(avatar_dir: &std::path::Path) -> Settings {
        let vars: HashMap<String, String> = [
            ("SECRET_KEY", "integration-test-secret"),
            ("BCRYPT_COST", "4"),
            ("PUBLIC_URL", "http://blog.test"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .chain([(
            "AVATAR_DIR".to_string(),
            avatar_dir.display().to_string(),
        )])
        .collect();
        Settings::from_vars(vars).expect("Failed to build test settings")
    }

    /// A running app plus the handles tests need to look behind it
    pub struct TestApp {
        pub server: TestServer,
        pub state: AppState,
        pub mailer: Arc<RecordingMailer>,
        pub avatars: TempDir,
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create the app behind a test server that keeps cookies between
    /// requests, like a browser would.
    pub async fn setup_test_app() -> TestApp {
        let _guard = init_test_tracing();

        let avatars = tempfile::tempdir().expect("Failed to create avatar dir");
        let settings = test_settings(avatars.path());
        let mailer = Arc::new(RecordingMailer::default());
        let state = build_app_state(setup_test_db().await, &settings, mailer.clone());

        let config = TestServerConfig {
            save_cookies: true,
            ..TestServerConfig::default()
        };
        let server = TestServer::new_with_config(create_router(state.clone()), config)
            .expect("Failed to start test server");

        TestApp {
            server,
            state,
            mailer,
            avatars,
        }
    }
}
