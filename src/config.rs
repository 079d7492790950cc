use anyhow::Result;
use std::env;
use std::time::Duration;

use crate::engine::AttendancePolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub environment: String,
    pub late_tolerance_minutes: i64,
    pub auto_checkout_after_hours: i64,
    pub auto_checkout_shift_hours: i64,
    pub sweep_interval_seconds: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        let config = Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://@localhost:5432/rollcall".to_string()),
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 5),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            late_tolerance_minutes: env_or("LATE_TOLERANCE_MINUTES", 5),
            auto_checkout_after_hours: env_or("AUTO_CHECKOUT_AFTER_HOURS", 12),
            auto_checkout_shift_hours: env_or("AUTO_CHECKOUT_SHIFT_HOURS", 9),
            sweep_interval_seconds: env_or("SWEEP_INTERVAL_SECONDS", 3600),
        };

        if config.sweep_interval_seconds == 0 {
            anyhow::bail!("SWEEP_INTERVAL_SECONDS must be greater than zero");
        }

        Ok(config)
    }

    pub fn test_config() -> Self {
        Config {
            database_url: env::var("TEST_DATABASE_URL")
                .unwrap_or_else(|_| "postgres://@localhost:5432/rollcall_test".to_string()),
            database_max_connections: 2,
            environment: "test".to_string(),
            late_tolerance_minutes: 5,
            auto_checkout_after_hours: 12,
            auto_checkout_shift_hours: 9,
            sweep_interval_seconds: 3600,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn attendance_policy(&self) -> AttendancePolicy {
        AttendancePolicy {
            late_tolerance: chrono::Duration::minutes(self.late_tolerance_minutes),
            auto_checkout_after: chrono::Duration::hours(self.auto_checkout_after_hours),
            auto_checkout_shift: chrono::Duration::hours(self.auto_checkout_shift_hours),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}
