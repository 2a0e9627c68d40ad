use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub supabase_url: String,
    pub service_role_key: String,
    pub jwt_secret: Option<String>,
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = env::var("SUPABASE_URL")
            .or_else(|_| env::var("NEXT_PUBLIC_SUPABASE_URL"))
            .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?;
        let service_role_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))?;

        let port = match env::var("PORT") {
            Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            Err(_) => 8080,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            service_role_key,
            jwt_secret: env::var("SUPABASE_JWT_SECRET").ok().filter(|s| !s.is_empty()),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
        })
    }

    pub fn require_jwt_secret(&self) -> Result<&str, ConfigError> {
        self.jwt_secret
            .as_deref()
            .ok_or(ConfigError::Missing("SUPABASE_JWT_SECRET"))
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }
}
