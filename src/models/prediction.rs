use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Status vocabulary of the hosted prediction API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }
}

/// One prediction as reported by the hosted API.
///
/// Only the fields the funnel consumes are modeled; the service returns
/// many more that are passed over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<PredictionOutput>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Prediction {
    /// First usable output URL, if any. A `succeeded` prediction without
    /// one is treated as a failure by the poller.
    pub fn output_url(&self) -> Option<&str> {
        self.output.as_ref().and_then(PredictionOutput::first_url)
    }
}

/// `output` is a bare URL or an array of URLs depending on the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    Single(String),
    Many(Vec<String>),
}

impl PredictionOutput {
    pub fn first_url(&self) -> Option<&str> {
        let url = match self {
            PredictionOutput::Single(url) => Some(url.as_str()),
            PredictionOutput::Many(urls) => urls.first().map(String::as_str),
        };
        url.filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_output() {
        let prediction: Prediction = serde_json::from_str(
            r#"{"id":"abc123","status":"succeeded","output":["https://x/img.jpg"]}"#,
        )
        .unwrap();

        assert_eq!(prediction.status, PredictionStatus::Succeeded);
        assert_eq!(prediction.output_url(), Some("https://x/img.jpg"));
    }

    #[test]
    fn parses_scalar_output() {
        let prediction: Prediction =
            serde_json::from_str(r#"{"id":"abc123","status":"succeeded","output":"https://x/img.jpg"}"#)
                .unwrap();

        assert_eq!(prediction.output_url(), Some("https://x/img.jpg"));
    }

    #[test]
    fn empty_output_is_not_usable() {
        let prediction: Prediction =
            serde_json::from_str(r#"{"id":"abc123","status":"succeeded","output":[]}"#).unwrap();
        assert_eq!(prediction.output_url(), None);

        let prediction: Prediction =
            serde_json::from_str(r#"{"id":"abc123","status":"succeeded","output":""}"#).unwrap();
        assert_eq!(prediction.output_url(), None);
    }

    #[test]
    fn parses_intermediate_status_without_output() {
        let prediction: Prediction =
            serde_json::from_str(r#"{"id":"abc123","status":"processing"}"#).unwrap();

        assert_eq!(prediction.status, PredictionStatus::Processing);
        assert!(!prediction.status.is_terminal());
        assert_eq!(prediction.output_url(), None);
    }

    #[test]
    fn parses_failure_with_error() {
        let prediction: Prediction = serde_json::from_str(
            r#"{"id":"abc123","status":"failed","error":"NSFW content detected"}"#,
        )
        .unwrap();

        assert!(prediction.status.is_terminal());
        assert_eq!(prediction.error.as_deref(), Some("NSFW content detected"));
    }
}
