use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

pub const DEFAULT_TODO_PORT: u16 = 8081;
pub const DEFAULT_USERS_PORT: u16 = 8082;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT_ATTEMPTS: u16 = 5;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_KEYCLOAK_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where a service listens
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// How many consecutive ports to try when the configured one is taken
    pub port_attempts: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Token verification settings.
///
/// A realm public key selects RS256, otherwise the shared secret selects HS256.
#[derive(Debug, Clone, Default)]
pub struct JwtConfig {
    pub public_key: Option<String>,
    pub secret: Option<String>,
    pub issuer: Option<String>,
    pub leeway_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    pub server_url: Url,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
}

impl ServerConfig {
    pub fn from_env(default_port: u16) -> Result<Self, ConfigError> {
        Self::from_lookup(default_port, env_lookup)
    }

    pub fn from_lookup<F>(default_port: u16, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = parse_value("SERVER_HOST", &host)?;
        let port = optional_parsed(&lookup, "SERVER_PORT")?.unwrap_or(default_port);
        let port_attempts =
            optional_parsed(&lookup, "SERVER_PORT_ATTEMPTS")?.unwrap_or(DEFAULT_PORT_ATTEMPTS);

        if port_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "SERVER_PORT_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            host,
            port,
            port_attempts,
        })
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            url: required(&lookup, "DATABASE_URL")?,
            max_connections: optional_parsed(&lookup, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        })
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_key = non_blank(lookup("JWT_PUBLIC_KEY"));
        let secret = non_blank(lookup("JWT_SECRET"));

        if public_key.is_none() && secret.is_none() {
            return Err(ConfigError::Missing("JWT_PUBLIC_KEY or JWT_SECRET"));
        }

        Ok(Self {
            public_key,
            secret,
            issuer: non_blank(lookup("JWT_ISSUER")),
            leeway_seconds: optional_parsed(&lookup, "JWT_LEEWAY_SECONDS")?.unwrap_or(0),
        })
    }
}

impl KeycloakConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = required(&lookup, "KEYCLOAK_SERVER_URL")?;
        let server_url =
            Url::parse(server_url.trim_end_matches('/')).map_err(|_| ConfigError::Invalid {
                name: "KEYCLOAK_SERVER_URL",
                value: server_url.clone(),
            })?;
        let timeout_seconds = optional_parsed(&lookup, "KEYCLOAK_TIMEOUT_SECONDS")?
            .unwrap_or(DEFAULT_KEYCLOAK_TIMEOUT_SECONDS);

        Ok(Self {
            server_url,
            realm: required(&lookup, "KEYCLOAK_REALM")?,
            client_id: required(&lookup, "KEYCLOAK_CLIENT_ID")?,
            client_secret: required(&lookup, "KEYCLOAK_CLIENT_SECRET")?,
            timeout: Duration::from_secs(timeout_seconds),
        })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(lookup(name)).ok_or(ConfigError::Missing(name))
}

fn optional_parsed<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    non_blank(lookup(name))
        .map(|value| parse_value(name, &value))
        .transpose()
}

fn parse_value<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}
