use std::borrow::Cow;

use serde::Serialize;

pub mod contact;

#[derive(Serialize)]
pub struct ApiError {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Cow<'static, str>>,
}
