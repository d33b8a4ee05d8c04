use serde::Deserialize;
use std::env;
use std::time::Duration;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub layout_store: LayoutStoreConfig,
    pub bookings: BookingsConfig,
    pub sessions: SessionsConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// `fmt` для людей, `json` для сборщика логов.
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Fmt,
    Json,
}

// Сервер сохранённых раскладок
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutStoreConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

// Подсистема бронирований
#[derive(Debug, Clone, Deserialize)]
pub struct BookingsConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

// Жизненный цикл сессий расселения
#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    pub idle_ttl_minutes: i64,
    pub eviction_interval_seconds: u64,
}

impl LayoutStoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl BookingsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl SessionsConfig {
    pub fn idle_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.idle_ttl_minutes)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_seconds)
    }
}

impl Config {
    /// Значения по умолчанию, поверх них - переменные окружения `ROOMING__<SECTION>__<KEY>`.
    /// `RUST_LOG`, если задан, перекрывает `app.rust_log`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8000)?
            .set_default("app.environment", "development")?
            .set_default("app.rust_log", "rooming_engine=debug,tower_http=debug")?
            .set_default("app.log_format", "fmt")?
            .set_default("layout_store.base_url", "http://localhost:9100/api")?
            .set_default("layout_store.timeout_seconds", 10)?
            .set_default("bookings.base_url", "http://localhost:9200/api")?
            .set_default("bookings.timeout_seconds", 10)?
            .set_default("sessions.idle_ttl_minutes", 120)?
            .set_default("sessions.eviction_interval_seconds", 300)?
            .add_source(
                config::Environment::with_prefix("ROOMING")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(directive) = env::var("RUST_LOG") {
            builder = builder.set_override("app.rust_log", directive)?;
        }

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = Config::load().unwrap();

        assert!(config.app.port > 0);
        assert!(!config.layout_store.base_url.is_empty());
        assert!(config.sessions.idle_ttl() > chrono::Duration::zero());
    }
}
