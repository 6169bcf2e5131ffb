// Application configuration, loaded from environment variables.

use std::path::PathBuf;

/// Cross-origin callers allowed by default: the original frontend dev servers.
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:8080",
    "http://localhost:5173",
    "http://localhost:3000",
];

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (SQLite connection string).
    pub database_url: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// API key for the external model provider. May be empty, in which case
    /// model calls fail and the per-operation fallbacks kick in.
    pub openai_api_key: String,
    /// Base URL of the OpenAI-compatible model provider.
    pub openai_base_url: String,
    /// Model name to request.
    pub openai_model: String,
    /// Directory containing the formation/concept catalog JSON files.
    pub catalog_dir: PathBuf,
    /// Cross-origin allow-list.
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `DATABASE_URL` - SQLite connection string (default: `sqlite:coachgrind.db?mode=rwc`)
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `OPENAI_API_KEY` - model provider API key (no default)
    /// - `OPENAI_BASE_URL` - provider base URL (default: `https://api.openai.com`)
    /// - `OPENAI_MODEL` - model name (default: `gpt-4o-mini`)
    /// - `CATALOG_DIR` - formation/concept catalog directory (default: `data/catalogs`)
    /// - `ALLOWED_ORIGINS` - comma-separated CORS allow-list
    pub fn load() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:coachgrind.db?mode=rwc".to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let openai_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();

        let openai_base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());

        let openai_model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let catalog_dir = std::env::var("CATALOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/catalogs"));

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                DEFAULT_ALLOWED_ORIGINS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        Config {
            database_url,
            port,
            openai_api_key,
            openai_base_url,
            openai_model,
            catalog_dir,
            allowed_origins,
        }
    }
}
