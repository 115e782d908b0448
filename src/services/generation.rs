use std::future::Future;

use reqwest::Client;

use crate::models::prediction::Prediction;
use crate::services::prompt::{ModelParams, PromptTemplate};

/// Client for the hosted image-generation API.
///
/// Submission makes exactly one outbound call; retries, if any, are the
/// caller's responsibility.
pub struct GenerationClient {
    http: Client,
    base_url: String,
    api_token: String,
    params: ModelParams,
    prompt: PromptTemplate,
}

/// Source of prediction status checks.
///
/// The poller is generic over this so tests can drive it with a scripted
/// sequence of responses instead of the network.
pub trait PredictionSource {
    fn get_prediction(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Prediction, GenerationError>> + Send;
}

impl GenerationClient {
    pub fn new(
        base_url: &str,
        api_token: &str,
        params: ModelParams,
        prompt: PromptTemplate,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            params,
            prompt,
        }
    }

    /// Submit one generation request and parse the immediate response into
    /// a prediction handle.
    pub async fn create_prediction(
        &self,
        image: &str,
        style: &str,
        zone: &str,
    ) -> Result<Prediction, GenerationError> {
        let url = format!("{}/v1/predictions", self.base_url);
        let prompt = self.prompt.render(style, zone);

        let body = serde_json::json!({
            "version": self.params.version,
            "input": {
                "image": image,
                "prompt": prompt,
                "num_inference_steps": self.params.num_inference_steps,
                "guidance": self.params.guidance,
                "megapixels": self.params.megapixels,
                "output_format": self.params.output_format,
                "output_quality": self.params.output_quality,
                "disable_safety_checker": self.params.disable_safety_checker,
            }
        });

        tracing::debug!(style, zone, "submitting prediction");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GenerationError::Rejected {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }

        let prediction: Prediction =
            serde_json::from_str(&text).map_err(|e| GenerationError::Protocol(e.to_string()))?;

        // The API can report a structured error inside a 2xx envelope.
        if let Some(error) = &prediction.error {
            return Err(GenerationError::Rejected {
                status: status.as_u16(),
                message: error.clone(),
            });
        }

        tracing::info!(prediction_id = %prediction.id, "prediction created");

        Ok(prediction)
    }
}

impl PredictionSource for GenerationClient {
    fn get_prediction(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Prediction, GenerationError>> + Send {
        let url = format!("{}/v1/predictions/{}", self.base_url, id);
        let request = self.http.get(url).bearer_auth(&self.api_token);

        async move {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;

            if !status.is_success() {
                return Err(GenerationError::Rejected {
                    status: status.as_u16(),
                    message: extract_error_message(&text),
                });
            }

            serde_json::from_str(&text).map_err(|e| GenerationError::Protocol(e.to_string()))
        }
    }
}

/// Pull a human-readable message out of an error response body. The API
/// uses both `{"error": ...}` and `{"detail": ...}` shapes.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error details".to_string()
    } else {
        trimmed.chars().take(300).collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Network or connection failure before a response arrived.
    #[error("request to generation API failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a structured error at creation or check time.
    #[error("generation API rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("unexpected response from generation API: {0}")]
    Protocol(String),
}
