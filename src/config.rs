/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, 認証プロバイダの secret / 公開鍵 など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub request_timeout: Duration,
    pub request_body_limit: usize,

    pub auth_secret_key: String,
    pub auth_authorized_parties: Vec<String>,
    pub auth_jwt_key: Option<String>,
    pub auth_public_routes: bool,
    pub auth_api_url: String,
    pub auth_clock_skew_seconds: u64,
    pub auth_jwks_cache_ttl_seconds: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("request_timeout", &self.request_timeout)
            .field("request_body_limit", &self.request_body_limit)
            .field("auth_authorized_parties", &self.auth_authorized_parties)
            .field("auth_jwt_key", &self.auth_jwt_key.as_ref().map(|_| "[REDACTED]"))
            .field("auth_public_routes", &self.auth_public_routes)
            .field("auth_api_url", &self.auth_api_url)
            .field("auth_clock_skew_seconds", &self.auth_clock_skew_seconds)
            .field("auth_jwks_cache_ttl_seconds", &self.auth_jwks_cache_ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = lookup("APP_ENV")
            .map(|raw| AppEnv::parse(&raw))
            .unwrap_or(AppEnv::Development);

        let request_timeout = Duration::from_secs(parse_or(
            &lookup,
            "REQUEST_TIMEOUT_SECONDS",
            30,
        )?);

        let request_body_limit = parse_or(&lookup, "REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;

        let auth_secret_key = lookup("AUTH_SECRET_KEY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("AUTH_SECRET_KEY"))?;

        let auth_authorized_parties = lookup("AUTH_AUTHORIZED_PARTIES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth_jwt_key = lookup("AUTH_JWT_KEY")
            .map(|pem| pem.replace("\\n", "\n"))
            .filter(|pem| !pem.trim().is_empty());

        let auth_public_routes = match lookup("AUTH_PUBLIC_ROUTES") {
            None => true,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => true,
                "false" | "0" | "off" | "no" => false,
                _ => return Err(ConfigError::Invalid("AUTH_PUBLIC_ROUTES")),
            },
        };

        let auth_api_url =
            lookup("AUTH_API_URL").unwrap_or_else(|| "https://api.clerk.com".to_string());
        url::Url::parse(&auth_api_url).map_err(|_| ConfigError::Invalid("AUTH_API_URL"))?;

        let auth_clock_skew_seconds = parse_or(&lookup, "AUTH_CLOCK_SKEW_SECONDS", 5)?;
        let auth_jwks_cache_ttl_seconds = parse_or(&lookup, "AUTH_JWKS_CACHE_TTL_SECONDS", 300)?;

        Ok(Self {
            addr,
            app_env,
            request_timeout,
            request_body_limit,
            auth_secret_key,
            auth_authorized_parties,
            auth_jwt_key,
            auth_public_routes,
            auth_api_url,
            auth_clock_skew_seconds,
            auth_jwks_cache_ttl_seconds,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_secret_key_fails_startup() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("AUTH_SECRET_KEY"));
    }

    #[test]
    fn blank_secret_key_is_treated_as_missing() {
        let err = Config::from_lookup(lookup_from(&[("AUTH_SECRET_KEY", "   ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("AUTH_SECRET_KEY"));
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup_from(&[("AUTH_SECRET_KEY", "sk_test")])).unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert!(config.auth_public_routes);
        assert!(config.auth_authorized_parties.is_empty());
        assert!(config.auth_jwt_key.is_none());
        assert_eq!(config.auth_api_url, "https://api.clerk.com");
        assert_eq!(config.auth_clock_skew_seconds, 5);
        assert_eq!(config.auth_jwks_cache_ttl_seconds, 300);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.request_body_limit, 1024 * 1024);
    }

    #[test]
    fn parses_lists_toggles_and_pem() {
        let config = Config::from_lookup(lookup_from(&[
            ("AUTH_SECRET_KEY", "sk_test"),
            ("AUTH_AUTHORIZED_PARTIES", "https://a.example, ,https://b.example"),
            ("AUTH_PUBLIC_ROUTES", "off"),
            ("AUTH_JWT_KEY", "-----BEGIN PUBLIC KEY-----\\nabc\\n-----END PUBLIC KEY-----"),
            ("APP_ENV", "Prod"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(
            config.auth_authorized_parties,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.auth_public_routes);
        assert_eq!(
            config.auth_jwt_key.as_deref(),
            Some("-----BEGIN PUBLIC KEY-----\nabc\n-----END PUBLIC KEY-----")
        );
        assert!(config.app_env.is_production());
        assert_eq!(config.addr.port(), 8080);
    }

    #[test]
    fn rejects_malformed_values() {
        let err = Config::from_lookup(lookup_from(&[
            ("AUTH_SECRET_KEY", "sk_test"),
            ("AUTH_PUBLIC_ROUTES", "maybe"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("AUTH_PUBLIC_ROUTES"));

        let err = Config::from_lookup(lookup_from(&[
            ("AUTH_SECRET_KEY", "sk_test"),
            ("AUTH_API_URL", "not a url"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("AUTH_API_URL"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = Config::from_lookup(lookup_from(&[
            ("AUTH_SECRET_KEY", "sk_live_very_secret"),
            ("AUTH_JWT_KEY", "pem-material"),
        ]))
        .unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk_live_very_secret"));
        assert!(!printed.contains("pem-material"));
    }
}
