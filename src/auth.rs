//! Trusted-proxy authentication.
//!
//! The service sits behind a reverse proxy that authenticates the user and
//! injects their opaque identifier into a configurable header (default
//! `x-sticker-user`). We never see credentials; an absent or unusable header
//! simply means the request is anonymous.
//!
//! Handlers pick one of two extractors:
//!
//! - [`CurrentUser`]: rejects anonymous requests with 401
//! - [`MaybeUser`]: passes anonymity through, for paths that decide between
//!   404/403 only after resolving the resource

use crate::types::UserId;
use crate::{errors::Error, AppState};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::trace;

/// Maximum accepted length of a proxy-injected user identifier
const MAX_USER_ID_LEN: usize = 64;

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
}

/// The possibly-anonymous caller of a request
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

/// Extract the caller identity from the proxy header, if present and usable.
///
/// A malformed value (empty, oversized, non-ASCII header bytes) is treated as
/// absent rather than an error: the proxy is trusted, so anything else is
/// noise from a client talking to us directly.
fn user_from_headers(parts: &Parts, state: &AppState) -> Option<CurrentUser> {
    let value = parts.headers.get(&state.config.auth.header_name)?;

    let user_id = match value.to_str() {
        Ok(s) => s.trim(),
        Err(_) => {
            trace!("Ignoring non-ASCII value in auth header");
            return None;
        }
    };

    if user_id.is_empty() || user_id.len() > MAX_USER_ID_LEN {
        trace!("Ignoring empty or oversized auth header value");
        return None;
    }

    Some(CurrentUser {
        id: user_id.to_string(),
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        user_from_headers(parts, state).ok_or(Error::Unauthenticated { message: None })
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(user_from_headers(parts, state)))
    }
}
