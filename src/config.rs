use anyhow::{Context, Result};
use chrono::FixedOffset;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub kafka_bootstrap_servers: String,
    pub kafka_notification_topic: String,
    pub kafka_sasl_mechanism: String,
    pub kafka_username: String,
    pub kafka_password: String,
    pub kafka_security_protocol: String,
    pub kafka_message_timeout_ms: u64,
    pub database_url: String,
    pub db_max_connections: u32,
    pub availability_url: String,
    pub availability_timeout_secs: u64,
    pub stations_file: String,
    pub alert_check_interval_secs: u64,
    pub local_utc_offset_minutes: i32,
    pub run_once: bool,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let kafka_bootstrap_servers =
            env::var("KAFKA_BOOTSTRAP_SERVERS").unwrap_or_else(|_| "localhost:9092".to_string());
        let kafka_notification_topic = env::var("KAFKA_NOTIFICATION_TOPIC")
            .unwrap_or_else(|_| "seat-alerts-notifications".to_string());
        let kafka_sasl_mechanism =
            env::var("KAFKA_SASL_MECHANISM").unwrap_or_else(|_| "SCRAM-SHA-256".to_string());
        let kafka_username = env::var("KAFKA_USERNAME").unwrap_or_default();
        let kafka_password = env::var("KAFKA_PASSWORD").unwrap_or_default();
        let kafka_security_protocol =
            env::var("KAFKA_SECURITY_PROTOCOL").unwrap_or_else(|_| "SASL_PLAINTEXT".to_string());
        let kafka_message_timeout_ms = env::var("KAFKA_MESSAGE_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .unwrap_or(5000);

        let db_host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let db_port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let db_name = env::var("DB_DATABASE").unwrap_or_else(|_| "seat_alerts".to_string());
        let db_user = env::var("DB_USER").unwrap_or_else(|_| "seat_alerts".to_string());
        let db_pwd = env::var("DB_PWD").unwrap_or_else(|_| "seat_alerts".to_string());

        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}",
            db_user, db_pwd, db_host, db_port, db_name
        );
        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let availability_url = env::var("AVAILABILITY_URL")
            .unwrap_or_else(|_| "http://localhost:3000/internal/trains/search".to_string());
        let availability_timeout_secs = env::var("AVAILABILITY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let stations_file =
            env::var("STATIONS_FILE").unwrap_or_else(|_| "stations_map.json".to_string());
        let alert_check_interval_secs = env::var("ALERT_CHECK_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        // Turkey has been on a fixed UTC+3 since 2016.
        let local_utc_offset_minutes = env::var("LOCAL_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "180".to_string())
            .parse()
            .unwrap_or(180);

        let run_once = env::var("RUN_ONCE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            kafka_bootstrap_servers,
            kafka_notification_topic,
            kafka_sasl_mechanism,
            kafka_username,
            kafka_password,
            kafka_security_protocol,
            kafka_message_timeout_ms,
            database_url,
            db_max_connections,
            availability_url,
            availability_timeout_secs,
            stations_file,
            alert_check_interval_secs,
            local_utc_offset_minutes,
            run_once,
            log_level,
        })
    }

    /// Offset used for the expiry cutoff and for the times shown in notifications.
    pub fn local_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.local_utc_offset_minutes * 60).with_context(|| {
            format!(
                "LOCAL_UTC_OFFSET_MINUTES out of range: {}",
                self.local_utc_offset_minutes
            )
        })
    }
}
