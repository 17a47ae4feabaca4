use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub face_service_url: String,
    pub smtp_host: String,
    pub smtp_user: String,
    pub mail_from: String,
    pub jwt_secret: String,
    pub smtp_password: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "1111"),
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379"),
            face_service_url: try_load("FACE_SERVICE_URL", "http://localhost:5001"),
            smtp_host: try_load("SMTP_HOST", "smtp.gmail.com"),
            smtp_user: try_load("SMTP_USER", "evote@localhost"),
            mail_from: try_load("MAIL_FROM", "evote@localhost"),
            jwt_secret: read_secret("JWT_SECRET"),
            smtp_password: read_secret("SMTP_PASSWORD"),
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

// Secrets come from the container secret mount, with a plain environment
// variable as the development fallback.
fn read_secret(secret_name: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .or_else(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
            env::var(secret_name)
        })
        .expect("Secrets misconfigured!")
}
