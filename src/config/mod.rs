use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000"). Optional for worker processes.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string for job queue
    pub redis_url: String,

    /// Google AI Studio API key for Gemini
    pub google_api_key: String,

    /// Gemini model for the vision extraction stage
    #[serde(default = "default_gemini_model")]
    pub gemini_vision_model: String,

    /// Gemini model for the analysis module stage
    #[serde(default = "default_gemini_model")]
    pub gemini_llm_model: String,

    /// Per-call ceiling for outbound Gemini requests, in seconds
    #[serde(default = "default_gemini_timeout_secs")]
    pub gemini_timeout_secs: u64,

    /// Object storage bucket for uploaded product photos
    pub s3_bucket: String,

    /// S3-compatible access key ID
    pub s3_access_key: String,

    /// S3-compatible secret access key
    pub s3_secret_key: String,

    /// S3-compatible endpoint URL
    pub s3_endpoint: String,

    /// AES-256-GCM encryption key (base64-encoded, 32 bytes)
    pub encryption_key: String,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash-8b".to_string()
}

fn default_gemini_timeout_secs() -> u64 {
    120
}

fn default_max_upload_size() -> usize {
    10 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
