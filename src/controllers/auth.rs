use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Extension, Json,
};
use std::sync::Arc;

use crate::domain::auth::{AuthService, IssueRequest, TokenResponse};
use crate::{
    domain::shared::RequestContext,
    error::{AppError, AppResult},
    infrastructure::auth::RequestId,
};

pub struct AuthController {
    auth_service: Arc<AuthService>,
}

impl AuthController {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self { auth_service }
    }

    /// POST /auth - Issue a token pair for a subject
    pub async fn issue(
        State(controller): State<Arc<AuthController>>,
        Extension(request_id): Extension<RequestId>,
        payload: Result<Json<IssueRequest>, JsonRejection>,
    ) -> AppResult<Json<TokenResponse>> {
        let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        let ctx = RequestContext::from(request_id);
        let response = controller.auth_service.issue(&ctx, &request.guid).await?;
        Ok(Json(response))
    }

    /// POST /refresh - Rotate the refresh token sent as a bearer credential
    pub async fn refresh(
        State(controller): State<Arc<AuthController>>,
        Extension(request_id): Extension<RequestId>,
        headers: HeaderMap,
    ) -> AppResult<Json<TokenResponse>> {
        let authorization = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::BadRequest("Authorization header is missing".to_string()))?
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization token format".to_string()))?;

        let ctx = RequestContext::from(request_id);
        let response = controller.auth_service.refresh(&ctx, authorization).await?;
        Ok(Json(response))
    }
}
