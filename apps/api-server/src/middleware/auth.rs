//! Authentication extractors.
//!
//! Handlers never see tokens: they receive an already-resolved user id, either
//! required ([`Identity`]) or optional ([`OptionalIdentity`]).

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};

use murmur_core::domain::UserId;
use murmur_core::ports::{AuthError, TokenClaims};
use murmur_shared::ErrorResponse;

use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, @{}!", identity.handle)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub handle: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            handle: claims.handle,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authentication token has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

/// Bearer token from the Authorization header; `None` when the header is absent.
fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, AuthError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

/// Resolve the caller. Absent credentials are not an error; bad ones are.
pub fn resolve(req: &HttpRequest) -> Result<Option<Identity>, AuthError> {
    let Some(token) = bearer_token(req)? else {
        return Ok(None);
    };

    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState not found in app data");
        AuthError::InvalidToken("Server configuration error".to_string())
    })?;

    state
        .tokens
        .validate_token(token)
        .map(|claims| Some(Identity::from(claims)))
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = match resolve(req) {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => Err(AuthenticationError(AuthError::MissingAuth)),
            Err(e) => Err(AuthenticationError(e)),
        };
        ready(identity)
    }
}

/// Optional identity extractor - anonymous callers pass, invalid tokens do not.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn user_id(&self) -> Option<UserId> {
        self.0.as_ref().map(|identity| identity.user_id)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve(req).map(OptionalIdentity).map_err(AuthenticationError))
    }
}
