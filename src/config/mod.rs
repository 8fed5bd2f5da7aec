//! Environment-sourced configuration.
//!
//! Loaded once at startup and never mutated afterwards. In dev, missing
//! variables fall back to defaults; in prod every variable must be set.

use std::env;

use anyhow::anyhow;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub tokens: TokenConfig,
    pub smtp: SmtpConfig,
    pub swagger_enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// External base URL, used to build email-verification links.
    pub public_url: String,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Signing secret and token lifetimes. Read-only after startup.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub verify_token_expire_hours: i64,
    pub refresh_token_expire_days: i64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_address: String,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::Config(anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        let config = AuthConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("stagepass"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            server: ServerConfig {
                port: parse_env("PORT", Some("8080"), is_prod)?,
                public_url: get_env("PUBLIC_URL", Some("http://localhost:8080"), is_prod)?,
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            database: DatabaseConfig {
                url: get_env(
                    "DATABASE_URL",
                    Some("postgres://localhost/stagepass"),
                    is_prod,
                )?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?,
            },
            tokens: TokenConfig {
                secret: get_env("JWT_SECRET", Some("dev-secret-do-not-use"), is_prod)?,
                algorithm: get_env("JWT_ALGORITHM", Some("HS256"), is_prod)?,
                access_token_expire_minutes: parse_env(
                    "ACCESS_TOKEN_EXPIRE_MINUTES",
                    Some("30"),
                    is_prod,
                )?,
                verify_token_expire_hours: parse_env(
                    "VERIFY_EMAIL_TOKEN_HOURS",
                    Some("24"),
                    is_prod,
                )?,
                refresh_token_expire_days: parse_env(
                    "REFRESH_TOKEN_EXPIRE_DAYS",
                    Some("7"),
                    is_prod,
                )?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("localhost"), is_prod)?,
                port: parse_env("SMTP_PORT", Some("587"), is_prod)?,
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_address: get_env("SMTP_FROM", Some("noreply@stagepass.local"), is_prod)?,
            },
            swagger_enabled: parse_env("ENABLE_SWAGGER", Some("true"), is_prod)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.server.port == 0 {
            return Err(AppError::Config(anyhow!("PORT must be greater than 0")));
        }

        if self.tokens.secret.is_empty() {
            return Err(AppError::Config(anyhow!("JWT_SECRET must not be empty")));
        }

        if self.tokens.access_token_expire_minutes <= 0 {
            return Err(AppError::Config(anyhow!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be positive"
            )));
        }

        if self.tokens.verify_token_expire_hours <= 0 {
            return Err(AppError::Config(anyhow!(
                "VERIFY_EMAIL_TOKEN_HOURS must be positive"
            )));
        }

        if self.tokens.refresh_token_expire_days <= 0 {
            return Err(AppError::Config(anyhow!(
                "REFRESH_TOKEN_EXPIRE_DAYS must be positive"
            )));
        }

        if self.environment == Environment::Prod {
            if self.tokens.secret == "dev-secret-do-not-use" {
                return Err(AppError::Config(anyhow!(
                    "JWT_SECRET must be set to a real secret in production"
                )));
            }
            if self.server.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::Config(anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::Config(anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::Config(anyhow!("{} is required but not set", key)))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, default, is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::Config(anyhow!("{}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!("DEV".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_lifetimes() {
        let mut config = test_config();
        config.tokens.access_token_expire_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_dev_secret_in_prod() {
        let mut config = test_config();
        config.environment = Environment::Prod;
        assert!(config.validate().is_err());
    }

    fn test_config() -> AuthConfig {
        AuthConfig {
            environment: Environment::Dev,
            service_name: "stagepass".to_string(),
            log_level: "info".to_string(),
            server: ServerConfig {
                port: 8080,
                public_url: "http://localhost:8080".to_string(),
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            database: DatabaseConfig {
                url: "postgres://localhost/stagepass".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            tokens: TokenConfig {
                secret: "dev-secret-do-not-use".to_string(),
                algorithm: "HS256".to_string(),
                access_token_expire_minutes: 30,
                verify_token_expire_hours: 24,
                refresh_token_expire_days: 7,
            },
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 587,
                user: String::new(),
                password: String::new(),
                from_address: "noreply@stagepass.local".to_string(),
            },
            swagger_enabled: true,
        }
    }
}
