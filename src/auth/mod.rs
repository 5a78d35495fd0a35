//! Request authentication.
//!
//! Every route except the health check requires a resolved user identity.
//! Identity comes from one of two places: a bearer token verified against an
//! external identity service, or, in dev mode only, a trusted `x-user-id`
//! header.

use std::fmt::Display;

mod middleware;
mod verifier;

pub use middleware::{AuthState, auth_guard};
pub use verifier::{HttpTokenVerifier, TokenVerifier};

/// The opaque identifier of an authenticated user.
///
/// All transaction data is partitioned by this identifier. It is placed into
/// the request extensions by [auth_guard], so route handlers can use the
/// function argument `Extension(user_id): Extension<UserId>` to receive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw identifier from the identity service or the dev header.
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
