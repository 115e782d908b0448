use garde::Validate;
use serde::{Deserialize, Serialize};

/// Contact details and quiz answers captured by the funnel.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LeadRequest {
    #[garde(email, length(max = 254))]
    pub email: String,

    #[garde(inner(length(min = 1, max = 120)))]
    pub name: Option<String>,

    /// "When do you plan to remodel?" quiz answer.
    #[garde(inner(length(min = 1, max = 120)))]
    pub remodel_date: Option<String>,

    /// "What is your main objective?" quiz answer.
    #[garde(inner(length(min = 1, max = 120)))]
    pub objective: Option<String>,
}

/// Payload shape expected by the external record store. Quiz answers are
/// uppercased, matching the collection's existing records.
#[derive(Debug, Serialize)]
pub struct LeadRecord {
    #[serde(rename = "Email")]
    pub email: String,

    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "Question_1")]
    pub question_1: String,

    #[serde(rename = "Question_2")]
    pub question_2: String,
}

impl From<&LeadRequest> for LeadRecord {
    fn from(lead: &LeadRequest) -> Self {
        Self {
            email: lead.email.clone(),
            name: lead.name.clone(),
            question_1: lead.remodel_date.as_deref().unwrap_or_default().to_uppercase(),
            question_2: lead.objective.as_deref().unwrap_or_default().to_uppercase(),
        }
    }
}

/// Record created by the store, as returned from its create endpoint.
#[derive(Debug, Deserialize)]
pub struct StoredLead {
    pub id: String,
}

/// Response after a lead was forwarded successfully.
#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub success: bool,
    pub id: String,
}
