//! Server configuration from environment variables

use thiserror::Error;

use crate::auth::codec::{Alphabet, BASE62, ClaimCodec};

const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_ACCESS_TTL_MS: i64 = 24 * 60 * 60 * 1000; // 1 day
const DEFAULT_REFRESH_TTL_MS: i64 = 30 * 24 * 60 * 60 * 1000; // 30 days
const DEFAULT_TEMP_TTL_MS: i64 = 15 * 60 * 1000; // 15 minutes
/// Upper bound for every lifetime; keeps `now + ttl` far from `i64::MAX`
pub const MAX_TTL_MS: i64 = 100 * 365 * 24 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be set in {environment} environment")]
    MissingVar { name: &'static str, environment: String },

    #[error("{name} has invalid value {value:?}: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid claim alphabet: {0}")]
    Alphabet(#[from] crate::auth::codec::AlphabetError),

    #[error("invalid claim signing key")]
    SigningKey,
}

/// Claim format and lifetimes
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub alphabet: String,
    pub separator: char,
    pub access_ttl_ms: i64,
    pub refresh_ttl_ms: i64,
    pub temp_credential_ttl_ms: i64,
    pub signing_key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            alphabet: BASE62.to_string(),
            separator: '.',
            access_ttl_ms: DEFAULT_ACCESS_TTL_MS,
            refresh_ttl_ms: DEFAULT_REFRESH_TTL_MS,
            temp_credential_ttl_ms: DEFAULT_TEMP_TTL_MS,
            signing_key: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub dir: Option<String>,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            json: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// development | staging | production
    pub environment: String,
    /// Unset means the in-memory store (development only)
    pub database_url: Option<String>,
    pub http_port: u16,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

impl Config {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] over an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let environment = var("ENVIRONMENT").unwrap_or_else(|| "development".into());
        let development = environment == "development";

        let database_url = var("DATABASE_URL");
        if database_url.is_none() && !development {
            return Err(ConfigError::MissingVar {
                name: "DATABASE_URL",
                environment,
            });
        }

        let signing_key = var("CLAIM_SIGNING_KEY");
        if signing_key.is_none() && !development {
            return Err(ConfigError::MissingVar {
                name: "CLAIM_SIGNING_KEY",
                environment,
            });
        }

        let separator = match var("CLAIM_SEPARATOR") {
            Some(raw) => single_char("CLAIM_SEPARATOR", &raw)?,
            None => '.',
        };

        let auth = AuthConfig {
            alphabet: var("CLAIM_ALPHABET").unwrap_or_else(|| BASE62.to_string()),
            separator,
            access_ttl_ms: ttl(&var, "ACCESS_TOKEN_TTL_MS", DEFAULT_ACCESS_TTL_MS)?,
            refresh_ttl_ms: ttl(&var, "REFRESH_TOKEN_TTL_MS", DEFAULT_REFRESH_TTL_MS)?,
            temp_credential_ttl_ms: ttl(&var, "TEMP_CREDENTIAL_TTL_MS", DEFAULT_TEMP_TTL_MS)?,
            signing_key,
        };
        ClaimCodec::new(Alphabet::new(&auth.alphabet)?, auth.separator)?;

        if auth.refresh_ttl_ms <= auth.access_ttl_ms {
            return Err(ConfigError::InvalidVar {
                name: "REFRESH_TOKEN_TTL_MS",
                value: auth.refresh_ttl_ms.to_string(),
                reason: "must be longer than ACCESS_TOKEN_TTL_MS".to_string(),
            });
        }

        let http_port = match var("HTTP_PORT") {
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidVar {
                name: "HTTP_PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_HTTP_PORT,
        };

        let log = LogConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            dir: var("LOG_DIR"),
            json: var("LOG_JSON").is_some_and(|v| v == "true" || v == "1"),
        };

        Ok(Self {
            environment,
            database_url,
            http_port,
            auth,
            log,
        })
    }
}

fn single_char(name: &'static str, raw: &str) -> Result<char, ConfigError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidVar {
            name,
            value: raw.to_string(),
            reason: "expected exactly one character".to_string(),
        }),
    }
}

fn ttl(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: i64,
) -> Result<i64, ConfigError> {
    let Some(raw) = var(name) else {
        return Ok(default);
    };
    match raw.parse::<i64>() {
        Ok(v) if v > 0 && v <= MAX_TTL_MS => Ok(v),
        Ok(_) => Err(ConfigError::InvalidVar {
            name,
            value: raw,
            reason: format!("must be between 1 and {MAX_TTL_MS}"),
        }),
        Err(e) => Err(ConfigError::InvalidVar {
            name,
            value: raw,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::codec::AlphabetError;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn development_defaults() {
        let config = load(&[]).unwrap();
        assert!(config.is_development());
        assert!(config.database_url.is_none());
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.auth.separator, '.');
        assert_eq!(config.auth.alphabet, BASE62);
        assert_eq!(config.auth.access_ttl_ms, 86_400_000);
        assert_eq!(config.auth.refresh_ttl_ms, 2_592_000_000);
        assert_eq!(config.auth.temp_credential_ttl_ms, 900_000);
        assert!(config.auth.signing_key.is_none());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn production_requires_database_and_key() {
        let err = load(&[("ENVIRONMENT", "production")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar { name: "DATABASE_URL", .. }));

        let err = load(&[("ENVIRONMENT", "production"), ("DATABASE_URL", "postgres://x")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar { name: "CLAIM_SIGNING_KEY", .. }));

        let ok = load(&[
            ("ENVIRONMENT", "production"),
            ("DATABASE_URL", "postgres://x"),
            ("CLAIM_SIGNING_KEY", "k"),
        ])
        .unwrap();
        assert_eq!(ok.auth.signing_key.as_deref(), Some("k"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(load(&[("CLAIM_SEPARATOR", "::")]).is_err());
        assert!(load(&[("ACCESS_TOKEN_TTL_MS", "0")]).is_err());
        assert!(load(&[("ACCESS_TOKEN_TTL_MS", "soon")]).is_err());
        assert!(load(&[("HTTP_PORT", "70000")]).is_err());
        assert!(load(&[("ACCESS_TOKEN_TTL_MS", "1000"), ("REFRESH_TOKEN_TTL_MS", "1000")]).is_err());
    }

    #[test]
    fn lifetimes_are_bounded() {
        let err = load(&[("REFRESH_TOKEN_TTL_MS", &i64::MAX.to_string())]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: "REFRESH_TOKEN_TTL_MS", .. }));
        assert!(load(&[("TEMP_CREDENTIAL_TTL_MS", &(MAX_TTL_MS + 1).to_string())]).is_err());

        let ok = load(&[("REFRESH_TOKEN_TTL_MS", &MAX_TTL_MS.to_string())]).unwrap();
        assert_eq!(ok.auth.refresh_ttl_ms, MAX_TTL_MS);
    }

    #[test]
    fn claim_characters_must_be_header_safe() {
        let err = load(&[("CLAIM_ALPHABET", "αβγδ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Alphabet(AlphabetError::NotVisibleAscii('α'))));

        let err = load(&[("CLAIM_SEPARATOR", "·")]).unwrap_err();
        assert!(matches!(err, ConfigError::Alphabet(AlphabetError::NotVisibleAscii('·'))));

        let err = load(&[("CLAIM_SEPARATOR", "a")]).unwrap_err();
        assert!(matches!(err, ConfigError::Alphabet(AlphabetError::SeparatorInAlphabet('a'))));

        assert!(load(&[("CLAIM_ALPHABET", "0123456789abcdef"), ("CLAIM_SEPARATOR", "-")]).is_ok());
    }

    #[test]
    fn log_json_flag() {
        assert!(load(&[("LOG_JSON", "true")]).unwrap().log.json);
        assert!(!load(&[("LOG_JSON", "no")]).unwrap().log.json);
    }
}
