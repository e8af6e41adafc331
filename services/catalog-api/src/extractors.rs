//! Axum extractors for authentication

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use reelgate_types::{Role, UserId};

use crate::state::AppState;

/// Authenticated user extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Check if user has the admin role
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorBody {
    success: bool,
    message: &'static str,
}

/// Auth rejection type
pub struct AuthRejection {
    status: StatusCode,
    message: &'static str,
}

impl AuthRejection {
    fn unauthorized(message: &'static str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = AuthErrorBody {
            success: false,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = extract_bearer(parts)?;
        let payload = app_state.tokens.verify(&token).map_err(|e| {
            tracing::debug!(error = ?e, "token verification failed");
            AuthRejection::unauthorized("Invalid or expired token")
        })?;

        let user_id = payload
            .user_id()
            .ok_or_else(|| AuthRejection::unauthorized("Invalid or expired token"))?;
        let role = payload.role();

        Ok(AuthUser {
            user_id,
            email: payload.email,
            role,
        })
    }
}

/// Extract the token from the Authorization header
fn extract_bearer(parts: &Parts) -> Result<String, AuthRejection> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Err(AuthRejection::unauthorized(
            "No authentication token provided",
        ));
    };

    let auth_str = auth_header.to_str().map_err(|_| AuthRejection {
        status: StatusCode::BAD_REQUEST,
        message: "Invalid Authorization header encoding",
    })?;

    auth_str
        .strip_prefix("Bearer ")
        .map(String::from)
        .ok_or_else(|| AuthRejection::unauthorized("No authentication token provided"))
}

/// Authenticated admin. Same extraction as [`AuthUser`] plus a role check.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Admin access required",
            });
        }
        Ok(AdminUser(user))
    }
}
