use folio_models::contact::ContactSubmission;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiContactSubmission {
    /// Full name of the sender
    pub name: Option<String>,
    /// Email address of the sender, used as `Reply-To`
    pub email: Option<String>,
    /// Company of the sender
    pub company: Option<String>,
    /// Content of the message
    pub message: Option<String>,
}

impl From<ApiContactSubmission> for ContactSubmission {
    fn from(value: ApiContactSubmission) -> Self {
        Self {
            name: value.name,
            email: value.email,
            company: value.company,
            message: value.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiContactReceipt {
    pub message: &'static str,
    /// `Message-ID` of the relayed email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}
