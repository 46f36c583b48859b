use crate::analytics::{DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub gsc_endpoint: String,
    pub gsc_token: Option<String>,
    pub gemini_endpoint: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub row_limit: u32,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("SEARCHDECK_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("SEARCHDECK_DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string()),
            gsc_endpoint: std::env::var("SEARCHDECK_GSC_ENDPOINT")
                .unwrap_or_else(|_| "https://www.googleapis.com".to_string()),
            gsc_token: std::env::var("SEARCHDECK_GSC_TOKEN").ok(),
            gemini_endpoint: std::env::var("SEARCHDECK_GEMINI_ENDPOINT")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            gemini_api_key: std::env::var("SEARCHDECK_GEMINI_API_KEY").ok(),
            gemini_model: std::env::var("SEARCHDECK_GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            row_limit: std::env::var("SEARCHDECK_ROW_LIMIT")
                .unwrap_or_else(|_| DEFAULT_ROW_LIMIT.to_string())
                .parse::<u32>()
                .unwrap_or(DEFAULT_ROW_LIMIT)
                .clamp(1, MAX_ROW_LIMIT),
            cors_origins: std::env::var("SEARCHDECK_CORS_ORIGINS")
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
        })
    }
}
