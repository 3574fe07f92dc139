use serde::{Deserialize, Serialize};

/// Result of a password check. `token` is omitted entirely on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl VerifyResponse {
    pub fn accepted(token: String) -> Self {
        Self { valid: true, token: Some(token) }
    }

    pub fn rejected() -> Self {
        Self { valid: false, token: None }
    }
}

/// Body returned by inserts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i32,
}

/// Body returned by updates and deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
