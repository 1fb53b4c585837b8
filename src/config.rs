use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::progression::{CertificationPolicy, CertificationSettings, ProgressionPolicy, XpPolicy};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// `None` runs the service on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub app: AppConfig,
    pub progression: ProgressionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub cors_allow_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
    pub catalog_path: Option<PathBuf>,
    /// Overrides the embedded Fluent resources when set.
    pub locales_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ProgressionConfig {
    pub xp_policy: XpPolicy,
    /// Level from which the canvas view is available.
    pub canvas_unlock_level: u32,
    pub commit_retries: u8,
    pub certificate_issuer: String,
    pub certificate_recognized_by: Vec<String>,
    pub certification: CertificationPolicy,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // Server configuration
        let host = var("SERVER_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;
        let port = var("SERVER_PORT", "8000")
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;
        let cors_allow_origin = lookup("CORS_ALLOW_ORIGIN").filter(|origin| !origin.is_empty());

        // Database configuration (optional)
        let database = match lookup("DATABASE_URL").filter(|url| !url.is_empty()) {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: Some(
                    var("DATABASE_MAX_CONNECTIONS", "10")
                        .parse()
                        .context("Failed to parse DATABASE_MAX_CONNECTIONS")?,
                ),
                min_connections: Some(
                    var("DATABASE_MIN_CONNECTIONS", "1")
                        .parse()
                        .context("Failed to parse DATABASE_MIN_CONNECTIONS")?,
                ),
            }),
            None => None,
        };

        // App configuration
        let environment = var("APP_ENVIRONMENT", "development")
            .parse::<Environment>()
            .unwrap_or_default();
        let app = AppConfig {
            name: var("APP_NAME", "Incubator Backend"),
            environment,
            catalog_path: lookup("CATALOG_PATH").map(PathBuf::from),
            locales_dir: lookup("LOCALES_DIR").map(PathBuf::from),
        };

        // Progression and certification
        let xp_policy = var("XP_POLICY", "module_reward")
            .parse::<XpPolicy>()
            .map_err(anyhow::Error::msg)
            .context("Failed to parse XP_POLICY")?;
        let canvas_unlock_level = var("CANVAS_UNLOCK_LEVEL", "3")
            .parse()
            .context("Failed to parse CANVAS_UNLOCK_LEVEL")?;
        let commit_retries = var("PROGRESSION_COMMIT_RETRIES", "3")
            .parse()
            .context("Failed to parse PROGRESSION_COMMIT_RETRIES")?;

        let minimum_quiz_score = match var("CERT_MINIMUM_QUIZ_SCORE", "75").trim() {
            "" | "none" => None,
            score => {
                let score: u8 = score
                    .parse()
                    .context("Failed to parse CERT_MINIMUM_QUIZ_SCORE")?;
                anyhow::ensure!(score <= 100, "CERT_MINIMUM_QUIZ_SCORE must be at most 100");
                Some(score)
            }
        };
        let certification = CertificationPolicy {
            complete_all_steps: parse_bool(&var("CERT_COMPLETE_ALL_STEPS", "true"))
                .context("Failed to parse CERT_COMPLETE_ALL_STEPS")?,
            minimum_quiz_score,
            form_validated: parse_bool(&var("CERT_FORM_VALIDATED", "false"))
                .context("Failed to parse CERT_FORM_VALIDATED")?,
        };

        let certificate_recognized_by = var("CERT_RECOGNIZED_BY", "")
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        Ok(Config {
            server: ServerConfig {
                host,
                port,
                cors_allow_origin,
            },
            database,
            app,
            progression: ProgressionConfig {
                xp_policy,
                canvas_unlock_level,
                commit_retries,
                certificate_issuer: var("CERT_ISSUER", "Incubateur"),
                certificate_recognized_by,
                certification,
            },
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == Environment::Production
    }

    pub fn progression_policy(&self) -> ProgressionPolicy {
        let progression = &self.progression;
        ProgressionPolicy {
            xp_policy: progression.xp_policy,
            commit_retries: progression.commit_retries,
            certification: CertificationSettings {
                defaults: progression.certification.clone(),
                issuer: progression.certificate_issuer.clone(),
                recognized_by: progression.certificate_recognized_by.clone(),
            },
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {:?}", other),
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

// Use once_cell for a global config instance that's initialized once
use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}
