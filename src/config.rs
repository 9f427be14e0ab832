use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Default image size ceiling (6 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 6 * 1024 * 1024;

#[derive(Clone)]
pub struct Config {
    // Admin authentication (absent values disable login, they do not fail startup).
    // Wiped from memory when the config is dropped.
    pub admin_password: Option<Zeroizing<String>>,
    pub auth_secret: Option<Zeroizing<String>>,

    // Redis
    pub redis_url: String,

    // Server
    pub bind_addr: SocketAddr,
    pub public_dir: PathBuf,
    pub uploads_dir: PathBuf,

    // Limits
    pub max_upload_bytes: usize,

    // Cookies
    pub secure_cookies: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("admin_password", &redacted(&self.admin_password))
            .field("auth_secret", &redacted(&self.auth_secret))
            .field("redis_url", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("public_dir", &self.public_dir)
            .field("uploads_dir", &self.uploads_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

fn redacted<T>(value: &Option<T>) -> &'static str {
    match value {
        Some(_) => "[REDACTED]",
        None => "[UNSET]",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Admin credentials - optional, empty counts as unset
        let admin_password = optional_secret("ADMIN_PASSWORD");
        let auth_secret = optional_secret("AUTH_SECRET");

        // Redis - product storage, required
        let redis_url =
            env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL".to_string()))?;
        if redis_url.is_empty() {
            return Err(ConfigError::InvalidValue(
                "REDIS_URL".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        let public_dir = PathBuf::from(env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".to_string()));
        let uploads_dir = match env::var("UPLOADS_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => public_dir.join("uploads"),
        };

        // Limits
        let max_upload_bytes = parse_env_or_default("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        if max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_UPLOAD_BYTES".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        // Secure cookies only when served over TLS in production
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let secure_cookies = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            admin_password,
            auth_secret,
            redis_url,
            bind_addr,
            public_dir,
            uploads_dir,
            max_upload_bytes,
            secure_cookies,
        })
    }
}

fn optional_secret(key: &str) -> Option<Zeroizing<String>> {
    env::var(key)
        .ok()
        .map(Zeroizing::new)
        .filter(|v| !v.is_empty())
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fixed configuration for handler and extractor tests.
    pub(crate) fn test_config() -> Config {
        Config {
            admin_password: Some(Zeroizing::new("hunter2".to_string())),
            auth_secret: Some(Zeroizing::new("k1".to_string())),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            public_dir: PathBuf::from("public"),
            uploads_dir: PathBuf::from("public/uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            secure_cookies: false,
        }
    }

    // Use a mutex to ensure tests run serially since they modify global env vars.
    // unwrap_or_else handles poison from prior panics.
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn lock_test() -> std::sync::MutexGuard<'static, ()> {
        TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Empty values stand in for "unset" so a local .env cannot leak in
    // (dotenvy doesn't override existing vars).
    fn clear_test_env() {
        env::set_var("ADMIN_PASSWORD", "");
        env::set_var("AUTH_SECRET", "");
        env::remove_var("REDIS_URL");
        env::remove_var("BIND_ADDR");
        env::remove_var("PUBLIC_DIR");
        env::remove_var("UPLOADS_DIR");
        env::remove_var("MAX_UPLOAD_BYTES");
        env::remove_var("APP_ENV");
    }

    #[test]
    fn test_parse_env_or_default() {
        let _guard = lock_test();

        env::set_var("TEST_USIZE", "12345");
        let result: Result<usize, ConfigError> = parse_env_or_default("TEST_USIZE", 100);
        assert_eq!(result.unwrap(), 12345);

        env::remove_var("TEST_USIZE");
        let result: Result<usize, ConfigError> = parse_env_or_default("TEST_USIZE", 100);
        assert_eq!(result.unwrap(), 100);

        env::set_var("TEST_USIZE", "lots");
        let result: Result<usize, ConfigError> = parse_env_or_default("TEST_USIZE", 100);
        assert!(matches!(result, Err(ConfigError::ParseError(ref k, _)) if k == "TEST_USIZE"));
        env::remove_var("TEST_USIZE");
    }

    #[test]
    fn test_missing_redis_url() {
        let _guard = lock_test();
        clear_test_env();

        // Empty rather than unset so a .env file cannot supply one
        env::set_var("REDIS_URL", "");

        let result = Config::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "REDIS_URL"
        ));

        clear_test_env();
    }

    #[test]
    fn test_invalid_socket_addr() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");
        env::set_var("BIND_ADDR", "invalid_address");

        let result = Config::from_env();
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_, _)));

        clear_test_env();
    }

    #[test]
    fn test_zero_upload_limit_rejected() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");
        env::set_var("MAX_UPLOAD_BYTES", "0");

        let result = Config::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "MAX_UPLOAD_BYTES"
        ));

        clear_test_env();
    }

    #[test]
    fn test_missing_credentials_do_not_fail_startup() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");

        let config = Config::from_env().unwrap();
        assert!(config.admin_password.is_none());
        assert!(config.auth_secret.is_none());

        clear_test_env();
    }

    #[test]
    fn test_credentials_loaded() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");
        env::set_var("ADMIN_PASSWORD", "hunter2");
        env::set_var("AUTH_SECRET", "k1");

        let config = Config::from_env().unwrap();
        assert_eq!(config.admin_password.as_deref().map(String::as_str), Some("hunter2"));
        assert_eq!(config.auth_secret.as_deref().map(String::as_str), Some("k1"));

        clear_test_env();
    }

    #[test]
    fn test_production_enables_secure_cookies() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");
        env::set_var("APP_ENV", "production");
        assert!(Config::from_env().unwrap().secure_cookies);

        env::set_var("APP_ENV", "staging");
        assert!(!Config::from_env().unwrap().secure_cookies);

        clear_test_env();
    }

    #[test]
    fn test_uploads_dir_follows_public_dir() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");
        env::set_var("PUBLIC_DIR", "/srv/site");
        let config = Config::from_env().unwrap();
        assert_eq!(config.public_dir, PathBuf::from("/srv/site"));
        assert_eq!(config.uploads_dir, PathBuf::from("/srv/site/uploads"));

        env::set_var("UPLOADS_DIR", "/var/uploads");
        let config = Config::from_env().unwrap();
        assert_eq!(config.uploads_dir, PathBuf::from("/var/uploads"));

        clear_test_env();
    }

    #[test]
    fn test_config_defaults() {
        let _guard = lock_test();
        clear_test_env();

        // Set required var + override any .env defaults to ensure predictable values
        env::set_var("REDIS_URL", "redis://127.0.0.1:6379");
        env::set_var("BIND_ADDR", "0.0.0.0:3000");
        env::set_var("PUBLIC_DIR", "public");
        env::set_var("MAX_UPLOAD_BYTES", "6291456");
        env::set_var("APP_ENV", "development");

        let config = Config::from_env().unwrap();

        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.uploads_dir, PathBuf::from("public/uploads"));
        assert_eq!(config.max_upload_bytes, 6_291_456);
        assert!(!config.secure_cookies);

        clear_test_env();
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = test_config();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("redis://"));
        assert!(debug.contains("[REDACTED]"));

        let mut config = test_config();
        config.auth_secret = None;
        assert!(format!("{:?}", config).contains("[UNSET]"));
    }
}
