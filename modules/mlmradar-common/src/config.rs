use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Model endpoint
    pub lmstudio_base_url: String,
    pub lmstudio_api_key: String,
    pub model_id: String,

    // Web server
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            lmstudio_base_url: env::var("LMSTUDIO_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:1234/v1".to_string()),
            lmstudio_api_key: env::var("LMSTUDIO_API_KEY")
                .unwrap_or_else(|_| "lm-studio".to_string()),
            model_id: required_env("MODEL_ID"),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .expect("API_PORT must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
