use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub venue: VenueConfig,
    pub reservation: ReservationConfig,
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

// Настройки приложения
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

// Настройки базы данных
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

// Схема зала
#[derive(Debug, Clone)]
pub struct VenueConfig {
    pub layout_path: String,
    pub default_price: i32,
}

// Удержание мест и рассылка обновлений
#[derive(Debug, Clone)]
pub struct ReservationConfig {
    pub hold_ttl_secs: u64,
    pub ws_write_timeout_secs: u64,
}

impl ReservationConfig {
    pub fn hold_ttl(&self) -> Duration {
        Duration::from_secs(self.hold_ttl_secs)
    }

    pub fn ws_write_timeout(&self) -> Duration {
        Duration::from_secs(self.ws_write_timeout_secs)
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self { hold_ttl_secs: 60, ws_write_timeout_secs: 5 }
    }
}

// Фоновая зачистка блокировок проданных мест; 0 отключает
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_or("PORT", 3000)?,
                environment: var_or("ENVIRONMENT", "development"),
                rust_log: var_or("RUST_LOG", "seat_reservation=debug,tower_http=debug"),
                log_format: parse_or("LOG_FORMAT", LogFormat::Pretty)?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                pool_size: parse_or("DB_POOL_SIZE", 20)?,
            },
            redis: RedisConfig {
                url: required("REDIS_URL")?,
            },
            venue: VenueConfig {
                layout_path: var_or("VENUE_LAYOUT_PATH", "venue_layout.json"),
                default_price: parse_or("DEFAULT_SEAT_PRICE", 100)?,
            },
            reservation: ReservationConfig {
                hold_ttl_secs: parse_or("HOLD_TTL_SECS", 60)?,
                ws_write_timeout_secs: parse_or("WS_WRITE_TIMEOUT_SECS", 5)?,
            },
            cleanup: CleanupConfig {
                interval_secs: parse_or("CLEANUP_INTERVAL_SECS", 30)?,
            },
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
