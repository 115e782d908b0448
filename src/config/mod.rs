use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// API token for the hosted image-generation service
    pub generation_api_token: String,

    /// Base URL of the hosted image-generation service
    #[serde(default = "default_generation_api_base")]
    pub generation_api_base: String,

    /// Model version hash override (defaults to the tuned FLUX Fill Dev build)
    #[serde(default)]
    pub model_version: Option<String>,

    /// Prompt template override; `{style}` and `{zone}` are substituted
    #[serde(default)]
    pub prompt_template: Option<String>,

    /// Base URL of the record store that keeps captured leads
    pub lead_store_url: String,

    /// Record-store collection leads are written to
    #[serde(default = "default_lead_collection")]
    pub lead_collection: String,

    /// Overall deadline for one generation, in seconds
    #[serde(default = "default_generation_deadline_secs")]
    pub generation_deadline_secs: u64,

    /// Client-side timeout for record-store calls, in seconds
    #[serde(default = "default_lead_timeout_secs")]
    pub lead_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_generation_api_base() -> String {
    "https://api.replicate.com".to_string()
}

fn default_lead_collection() -> String {
    "funnel_leads".to_string()
}

fn default_generation_deadline_secs() -> u64 {
    90
}

fn default_lead_timeout_secs() -> u64 {
    8
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
