use std::env;

use chrono::NaiveTime;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_api_key: String,
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    pub slot_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            store_url: env::var("CLINIC_STORE_URL")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_STORE_URL not set, using empty value");
                    String::new()
                }),
            store_api_key: env::var("CLINIC_STORE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_STORE_API_KEY not set, using empty value");
                    String::new()
                }),
            day_start: parse_time_var("CLINIC_DAY_START", "08:00"),
            day_end: parse_time_var("CLINIC_DAY_END", "18:00"),
            slot_minutes: env::var("CLINIC_SLOT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.store_url.is_empty() && !self.store_api_key.is_empty()
    }
}

fn parse_time_var(name: &str, default: &str) -> NaiveTime {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M").unwrap_or_else(|_| {
        warn!("{} is not a valid HH:MM time, using default {}", name, default);
        NaiveTime::parse_from_str(default, "%H:%M").expect("default time is valid")
    })
}
