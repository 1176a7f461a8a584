use serde::{Deserialize, Serialize};

/// Token pair returned by both issuance and rotation
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Initial issuance request
#[derive(Debug, Serialize, Deserialize)]
pub struct IssueRequest {
    pub guid: String,
}
