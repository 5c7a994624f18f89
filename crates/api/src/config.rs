use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// Built once at startup and handed to the router through `AppState`;
/// nothing reads the environment after that.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `4000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Maximum request body size for multipart uploads (default: 50 MiB).
    pub max_upload_bytes: usize,
    /// Where the portfolio document, images, and staged uploads live.
    pub storage: StorageConfig,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// The single admin account allowed to log in.
    pub admin: AdminCredentials,
}

/// Filesystem locations used by the service.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Path of the portfolio JSON document.
    pub portfolio_path: PathBuf,
    /// Images root, served at `/images`.
    pub images_dir: PathBuf,
    /// Directory uploads are staged in before being committed.
    pub upload_temp_dir: PathBuf,
}

/// Admin login credentials. The password is stored as an Argon2id PHC hash.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password_hash: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Default upload body limit (50 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                          |
    /// |------------------------|----------------------------------|
    /// | `HOST`                 | `0.0.0.0`                        |
    /// | `PORT`                 | `4000`                           |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`          |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                             |
    /// | `MAX_UPLOAD_BYTES`     | `52428800`                       |
    /// | `PORTFOLIO_PATH`       | `portfolio.json`                 |
    /// | `IMAGES_DIR`           | `images`                         |
    /// | `UPLOAD_TEMP_DIR`      | `<system temp>/folio-uploads`    |
    /// | `ADMIN_USERNAME`       | `admin`                          |
    /// | `ADMIN_PASSWORD_HASH`  | **required**                     |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on unparsable numbers or a missing `ADMIN_PASSWORD_HASH`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "4000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let storage = StorageConfig {
            portfolio_path: std::env::var("PORTFOLIO_PATH")
                .unwrap_or_else(|_| "portfolio.json".into())
                .into(),
            images_dir: std::env::var("IMAGES_DIR")
                .unwrap_or_else(|_| "images".into())
                .into(),
            upload_temp_dir: std::env::var("UPLOAD_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir().join("folio-uploads")),
        };

        let admin = AdminCredentials {
            username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
            password_hash: std::env::var("ADMIN_PASSWORD_HASH")
                .expect("ADMIN_PASSWORD_HASH must be set in the environment"),
        };

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            storage,
            jwt,
            admin,
        }
    }
}
