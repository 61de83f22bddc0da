use serde::Deserialize;
use std::env;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub hold: HoldConfig,
    pub payment: PaymentConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки удержания столов при бронировании
#[derive(Debug, Clone, Deserialize)]
pub struct HoldConfig {
    pub ttl_minutes: i64,
    pub sweep_interval_secs: u64,
}

// Настройки приёма оплаты (PromptPay + слипы)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub promptpay_id: String,
    pub slip_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "table_reserve=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://table_reserve.db".to_string()),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
            },
            hold: HoldConfig {
                ttl_minutes: env::var("HOLD_TTL_MINUTES")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("HOLD_TTL_MINUTES must be a valid number"),
                sweep_interval_secs: env::var("HOLD_SWEEP_INTERVAL_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .expect("HOLD_SWEEP_INTERVAL_SECS must be a valid number"),
            },
            payment: PaymentConfig {
                promptpay_id: env::var("PROMPTPAY_ID")
                    .unwrap_or_else(|_| "0812345678".to_string()),
                slip_dir: env::var("SLIP_DIR").unwrap_or_else(|_| "public/slips".to_string()),
            },
        }
    }
}
