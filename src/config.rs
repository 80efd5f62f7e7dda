// src/config.rs
use serde::Deserialize;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3004
}

fn default_model_path() -> String {
    "./models".to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_popular_cache_ttl_secs() -> u64 {
    300
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_popular_cache_ttl_secs")]
    pub popular_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Message for an unexpected failure; the cause is only exposed in development.
    pub fn failure_detail(&self, context: &str, cause: &dyn std::fmt::Display) -> String {
        if self.is_development() {
            format!("{}: {}", context, cause)
        } else {
            context.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config: Config = envy::from_iter(vec![(
            "DATABASE_URL".to_string(),
            "postgres://localhost/oil".to_string(),
        )])
        .unwrap();
        assert_eq!(config.port, 3004);
        assert_eq!(config.model_path, "./models");
        assert!(!config.is_development());
        assert_eq!(config.failure_detail("Prediction failed", &"boom"), "Prediction failed");
    }

    #[test]
    fn development_exposes_cause() {
        let config: Config = envy::from_iter(vec![
            ("DATABASE_URL".to_string(), "postgres://localhost/oil".to_string()),
            ("ENVIRONMENT".to_string(), "development".to_string()),
        ])
        .unwrap();
        assert_eq!(
            config.failure_detail("Prediction failed", &"boom"),
            "Prediction failed: boom"
        );
    }
}
