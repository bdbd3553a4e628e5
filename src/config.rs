use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub alert_to: String,
    pub admin_user: String,
    pub admin_pass: String,
    pub feedback_file: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "3000"),
            smtp_host: var("SMTP_HOST").ok(),
            smtp_port: try_load("SMTP_PORT", "587"),
            smtp_user: var("SMTP_USER").ok(),
            smtp_pass: var("SMTP_PASS").ok(),
            alert_to: try_load("ALERT_TO", "altheaparrocha0@gmail.com"),
            admin_user: try_load("ADMIN_USER", "admin"),
            admin_pass: try_load("ADMIN_PASS", "admin123"),
            feedback_file: try_load("FEEDBACK_FILE", "feedbacks.json"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
