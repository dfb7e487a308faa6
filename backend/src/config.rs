//! Startup configuration.
//!
//! `AppConfig` is assembled once in `main` from the process environment and then shared
//! read-only through the actix application state. Nothing reads environment variables
//! after startup.

use common::model::status::DatabaseSummary;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024; // 10 MB
const DEFAULT_PAGE_SIZE: u32 = 100;
const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is not set")]
    Missing(&'static str),

    #[error("Configuration validation failed: {}", .0.join(", "))]
    Invalid(Vec<String>),
}

/// Database driver identifier (`DB_DRIVER`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseDriver {
    Sqlite,
}

impl DatabaseDriver {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Some(DatabaseDriver::Sqlite),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseDriver::Sqlite => "sqlite",
        }
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub driver: DatabaseDriver,
    /// For SQLite, the path of the database file.
    pub name: String,
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Target table. Validated as a plain identifier, since it is the one name that
    /// has to be spliced into SQL text.
    pub table: String,
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    /// Connection string handed to the driver.
    ///
    /// `mode=rw` makes a missing database file a connection failure instead of a new,
    /// empty database. The path is percent-encoded where URI syntax would cut it short.
    pub fn connection_string(&self) -> String {
        match self.driver {
            DatabaseDriver::Sqlite => format!("file:{}?mode=rw", uri_path(&self.name)),
        }
    }

    pub fn summary(&self) -> DatabaseSummary {
        DatabaseSummary {
            name: self.name.clone(),
            server: self.host.clone(),
            table: self.table.clone(),
        }
    }
}

fn uri_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '%' => out.push_str("%25"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            c => out.push(c),
        }
    }
    out
}

// Never print the password, including through `{:?}`.
impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "driver={} host={} database={} user={} table={}",
            self.driver.as_str(),
            self.host,
            self.name,
            self.username.as_deref().unwrap_or("-"),
            self.table
        )
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("driver", &self.driver)
            .field("name", &self.name)
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("table", &self.table)
            .field("busy_timeout", &self.busy_timeout)
            .finish()
    }
}

/// The single shared credential pair guarding the protected endpoints.
#[derive(Clone)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        PageLimits {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub pages: PageLimits,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Every validation problem is
    /// collected so a bad deployment is fixed in one round.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_name = required("DB_NAME")?;
        let table = required("TABLE_NAME")?;
        let api_username = required("API_USERNAME")?;
        let api_password = required("API_PASSWORD")?;

        let mut errors = Vec::new();

        let driver_raw = optional("DB_DRIVER").unwrap_or_else(|| "sqlite".to_string());
        let driver = DatabaseDriver::parse(&driver_raw);
        if driver.is_none() {
            errors.push(format!("DB_DRIVER '{driver_raw}' is not supported"));
        }
        if db_name.trim().is_empty() {
            errors.push("DB_NAME cannot be empty".to_string());
        }
        if !is_identifier(&table) {
            errors.push(format!("TABLE_NAME '{table}' is not a valid identifier"));
        }
        if api_username.is_empty() {
            errors.push("API_USERNAME cannot be empty".to_string());
        }
        if api_password.is_empty() {
            errors.push("API_PASSWORD cannot be empty".to_string());
        }

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT, &mut errors);
        let max_upload_bytes = parse_or(
            &lookup,
            "MAX_UPLOAD_BYTES",
            DEFAULT_MAX_UPLOAD_BYTES,
            &mut errors,
        );
        let default_page_size = parse_or(&lookup, "DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE, &mut errors);
        let max_page_size = parse_or(&lookup, "MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE, &mut errors);
        let busy_timeout_ms = parse_or(
            &lookup,
            "DB_BUSY_TIMEOUT_MS",
            DEFAULT_BUSY_TIMEOUT_MS,
            &mut errors,
        );

        if max_page_size == 0 {
            errors.push("MAX_PAGE_SIZE must be at least 1".to_string());
        }
        if default_page_size == 0 || default_page_size > max_page_size {
            errors.push(format!(
                "DEFAULT_PAGE_SIZE must be between 1 and MAX_PAGE_SIZE ({max_page_size})"
            ));
        }
        if max_upload_bytes == 0 {
            errors.push("MAX_UPLOAD_BYTES must be at least 1".to_string());
        }

        let driver = match driver {
            Some(driver) if errors.is_empty() => driver,
            _ => return Err(ConfigError::Invalid(errors)),
        };

        Ok(AppConfig {
            database: DatabaseConfig {
                driver,
                name: db_name,
                host: optional("HOST_NAME").unwrap_or_else(|| "localhost".to_string()),
                username: optional("DB_USERNAME"),
                password: optional("DB_PASSWORD"),
                table,
                busy_timeout: Duration::from_millis(busy_timeout_ms),
            },
            auth: AuthConfig {
                username: api_username,
                password: api_password,
            },
            server: ServerConfig {
                host: optional("BIND_HOST").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string()),
                port,
                max_upload_bytes,
            },
            pages: PageLimits {
                default_page_size,
                max_page_size,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T, errors: &mut Vec<String>) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            errors.push(format!("{key} '{raw}' is not a valid number"));
            default
        }),
    }
}

/// `true` for names that are safe to quote into SQL as an identifier.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}
