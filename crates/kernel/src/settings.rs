use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "ATLAS_ENV";
const CONFIG_DIR_ENV: &str = "ATLAS_CONFIG_DIR";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    ///
    /// Environment variables use a double underscore between sections,
    /// e.g. `ATLAS_AUTH__JWT_SECRET` or `ATLAS_SERVER__PORT`.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            // Default to repo root `config` directory.
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_filename = format!("{}.toml", environment);
        let environment_path = config_dir.join(environment_filename);

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix("ATLAS")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = match environment.as_str() {
            "local" => Environment::Local,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(anyhow!(
                    "unsupported environment '{}'; expected local/staging/production",
                    other
                ));
            }
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Reject combinations that are only acceptable on a developer machine.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.environment != Environment::Local
            && self.auth.jwt_secret == AuthSettings::default_jwt_secret()
        {
            return Err(anyhow!(
                "auth.jwt_secret must be set outside the local environment"
            ));
        }
        if self.auth.token_ttl_secs <= 0 {
            return Err(anyhow!("auth.token_ttl_secs must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "DatabaseSettings::default_namespace")]
    pub namespace: String,
    #[serde(default = "DatabaseSettings::default_database")]
    pub database: String,
}

impl DatabaseSettings {
    fn default_endpoint() -> String {
        "mem://".to_string()
    }

    fn default_namespace() -> String {
        "bookshelf".to_string()
    }

    fn default_database() -> String {
        "core".to_string()
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            namespace: Self::default_namespace(),
            database: Self::default_database(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info,tower_http=info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// HMAC secret used to sign bearer tokens.
    #[serde(default = "AuthSettings::default_jwt_secret")]
    pub jwt_secret: String,
    /// Lifetime of an issued bearer token, in seconds.
    #[serde(default = "AuthSettings::default_token_ttl_secs")]
    pub token_ttl_secs: i64,
}

impl AuthSettings {
    fn default_jwt_secret() -> String {
        "local-development-secret".to_string()
    }

    fn default_token_ttl_secs() -> i64 {
        24 * 60 * 60
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: Self::default_jwt_secret(),
            token_ttl_secs: Self::default_token_ttl_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_database_endpoint_is_in_memory() {
        let settings = Settings::default();
        assert_eq!(settings.database.endpoint, "mem://");
        assert_eq!(settings.database.namespace, "bookshelf");
    }

    #[test]
    fn local_settings_validate_with_default_secret() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn production_requires_explicit_secret() {
        let mut settings = Settings {
            environment: Environment::Production,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        settings.auth.jwt_secret = "a-real-secret".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn non_positive_token_ttl_is_rejected() {
        let mut settings = Settings::default();
        settings.auth.token_ttl_secs = 0;
        assert!(settings.validate().is_err());
    }
}
