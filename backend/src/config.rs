use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// immutable afterwards; handlers and the `AuthUser` extractor pull it out of the
/// shared state via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // SQLite connection string, e.g. `sqlite://gallery.db?mode=rwc`.
    pub db_url: String,
    // Address the HTTP server binds to.
    pub bind_addr: String,
    // Directory receiving uploaded photo files.
    pub upload_dir: String,
    // Runtime environment marker. Selects the log format and the fail-fast rules.
    pub env: Env,
    // Optional session lifetime in seconds. `None` keeps tokens valid until
    // they are rotated by a login or cleared by a signout.
    pub token_ttl_secs: Option<u64>,
    // Server-side key mixed into tokens assigned by the lazy backfill.
    pub backfill_key: String,
    // Largest request body accepted by the photo upload route, in bytes.
    pub max_upload_bytes: usize,
}

/// Env
///
/// Defines the runtime context: pretty logs and development defaults locally,
/// JSON logs and mandatory secrets in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_DB_URL: &str = "sqlite://gallery.db?mode=rwc";
const LOCAL_BACKFILL_KEY: &str = "local-backfill-key";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            upload_dir: env::temp_dir()
                .join("photo-gallery-test-uploads")
                .to_string_lossy()
                .into_owned(),
            env: Env::Local,
            token_ttl_secs: None,
            backfill_key: LOCAL_BACKFILL_KEY.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` or `TOKEN_BACKFILL_KEY` is not set,
    /// so the server never starts against an implicit database or a guessable key.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.to_string());
        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0);
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|bytes| *bytes > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL").unwrap_or_else(|_| LOCAL_DB_URL.to_string()),
                bind_addr,
                upload_dir,
                token_ttl_secs,
                max_upload_bytes,
                backfill_key: env::var("TOKEN_BACKFILL_KEY")
                    .unwrap_or_else(|_| LOCAL_BACKFILL_KEY.to_string()),
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                bind_addr,
                upload_dir,
                token_ttl_secs,
                max_upload_bytes,
                backfill_key: env::var("TOKEN_BACKFILL_KEY")
                    .expect("FATAL: TOKEN_BACKFILL_KEY required in prod"),
            },
        }
    }
}
