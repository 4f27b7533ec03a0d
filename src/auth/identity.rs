use std::future::{ready, Ready};

use actix_web::{FromRequest, HttpRequest};

use crate::errors::AppError;

/// Header carrying the id of the signed-in user, set by the identity provider
/// in front of this service.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Extractor for the user a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser(pub String);

impl ActingUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl FromRequest for ActingUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let user = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| ActingUser(id.to_string()))
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()));

        ready(user)
    }
}
