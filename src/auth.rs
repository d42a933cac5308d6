//! Caller identity.
//!
//! Authentication itself is an external collaborator: a trusted identity
//! proxy terminates the session and forwards the authenticated user id and
//! staff claim as headers. This module only extracts and types that claim;
//! the staff capability is enforced in the services, where it is business
//! data rather than routing concern.

use crate::errors::ServiceError;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the authenticated user id (a UUID).
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the staff claim ("true"/"1" when the caller is staff).
pub const USER_STAFF_HEADER: &str = "x-user-staff";

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub is_staff: bool,
}

impl CurrentUser {
    pub fn user(id: Uuid) -> Self {
        Self {
            id,
            is_staff: false,
        }
    }

    pub fn staff(id: Uuid) -> Self {
        Self { id, is_staff: true }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("missing user identity".to_string()))?;

        let id = Uuid::parse_str(id)
            .map_err(|_| ServiceError::Unauthorized("malformed user identity".to_string()))?;

        let is_staff = parts
            .headers
            .get(USER_STAFF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(CurrentUser { id, is_staff })
    }
}
