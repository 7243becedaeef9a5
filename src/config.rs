#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Total budget for one outbound request, redirects included.
    /// Set via INDIETOKEN_HTTP_TIMEOUT_MS. Default: 4000.
    pub http_timeout_ms: u64,
    /// Set via INDIETOKEN_CONNECT_TIMEOUT_MS. Default: 2000.
    pub connect_timeout_ms: u64,
    /// Redirect hops followed for discovery and code exchange.
    pub max_redirects: usize,
    /// Inbound form body limit in bytes.
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8443,
            database_url: "postgres://localhost/indietoken".into(),
            http_timeout_ms: 4000,
            connect_timeout_ms: 2000,
            max_redirects: 8,
            max_body_bytes: 1024 * 1024,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let defaults = Config::default();
    let config = Config {
        port: env_or("INDIETOKEN_PORT", defaults.port),
        database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
        http_timeout_ms: env_or("INDIETOKEN_HTTP_TIMEOUT_MS", defaults.http_timeout_ms),
        connect_timeout_ms: env_or("INDIETOKEN_CONNECT_TIMEOUT_MS", defaults.connect_timeout_ms),
        max_redirects: env_or("INDIETOKEN_MAX_REDIRECTS", defaults.max_redirects),
        max_body_bytes: env_or("INDIETOKEN_MAX_BODY_BYTES", defaults.max_body_bytes),
    };

    if config.http_timeout_ms == 0 || config.connect_timeout_ms == 0 {
        anyhow::bail!("INDIETOKEN_HTTP_TIMEOUT_MS and INDIETOKEN_CONNECT_TIMEOUT_MS must be non-zero");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 8443);
        assert_eq!(cfg.http_timeout_ms, 4000);
        assert_eq!(cfg.connect_timeout_ms, 2000);
        assert_eq!(cfg.max_redirects, 8);
        assert_eq!(cfg.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("INDIETOKEN_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("INDIETOKEN_TEST_GARBAGE", 42u64), 42);
        std::env::set_var("INDIETOKEN_TEST_GARBAGE", "7");
        assert_eq!(env_or("INDIETOKEN_TEST_GARBAGE", 42u64), 7);
        std::env::remove_var("INDIETOKEN_TEST_GARBAGE");
    }
}
