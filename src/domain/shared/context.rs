use uuid::Uuid;

/// Per-request diagnostics handed explicitly through the token flows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    /// Context for work that did not arrive through HTTP
    pub fn detached() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}
