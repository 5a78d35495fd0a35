//! Token verification against an external identity service.

use async_trait::async_trait;

use crate::{Error, auth::UserId};

/// Verifies bearer tokens and resolves them to user identities.
///
/// The production implementation is [HttpTokenVerifier]. Tests substitute
/// their own stub implementations.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Check `token` and return the ID of the user it belongs to.
    ///
    /// # Errors
    /// Returns [Error::InvalidAuthToken] if the token is rejected or the
    /// identity service cannot be reached.
    async fn verify(&self, token: &str) -> Result<UserId, Error>;
}

/// A [TokenVerifier] that POSTs each token to an identity service.
///
/// The service is expected to answer a successful verification with a JSON
/// object carrying the user ID under one of the keys `user_id`, `uid` or
/// `sub`, which covers the common identity providers.
pub struct HttpTokenVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl HttpTokenVerifier {
    /// Create a verifier that calls `verify_url`.
    pub fn new(verify_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            verify_url: verify_url.to_owned(),
        }
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, Error> {
        let response = self
            .client
            .post(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| {
                tracing::error!("could not reach the identity service: {error}");
                Error::InvalidAuthToken
            })?;

        if !response.status().is_success() {
            tracing::debug!(
                "the identity service rejected a token: HTTP {}",
                response.status()
            );
            return Err(Error::InvalidAuthToken);
        }

        let body: serde_json::Value = response.json().await.map_err(|error| {
            tracing::error!("could not parse the identity service response: {error}");
            Error::InvalidAuthToken
        })?;

        ["user_id", "uid", "sub"]
            .iter()
            .find_map(|key| body.get(key).and_then(|value| value.as_str()))
            .map(UserId::new)
            .ok_or_else(|| {
                tracing::error!("the identity service response did not contain a user ID");
                Error::InvalidAuthToken
            })
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode, header::AUTHORIZATION},
        routing::post,
    };
    use axum_server::Handle;
    use serde_json::json;

    use crate::{
        Error,
        auth::{HttpTokenVerifier, TokenVerifier, UserId},
    };

    const VALID_TOKEN: &str = "sesame";

    async fn stub_identity_endpoint(
        headers: HeaderMap,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match token {
            Some(VALID_TOKEN) => Ok(Json(json!({ "uid": "alice" }))),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }

    async fn run_stub_identity_service() -> String {
        let app = Router::new().route("/verify", post(stub_identity_endpoint));
        let handle = Handle::<std::net::SocketAddr>::new();

        tokio::spawn(
            axum_server::bind("127.0.0.1:0".parse().unwrap())
                .handle(handle.clone())
                .serve(app.into_make_service()),
        );

        let address = handle.listening().await.expect("server did not start");

        format!("http://{address}/verify")
    }

    #[tokio::test]
    async fn verify_resolves_user_id() {
        let verify_url = run_stub_identity_service().await;
        let verifier = HttpTokenVerifier::new(&verify_url);

        let user_id = verifier.verify(VALID_TOKEN).await;

        assert_eq!(user_id, Ok(UserId::new("alice")));
    }

    #[tokio::test]
    async fn verify_rejects_unknown_token() {
        let verify_url = run_stub_identity_service().await;
        let verifier = HttpTokenVerifier::new(&verify_url);

        let user_id = verifier.verify("letmein").await;

        assert_eq!(user_id, Err(Error::InvalidAuthToken));
    }

    #[tokio::test]
    async fn verify_rejects_unreachable_service() {
        let verifier = HttpTokenVerifier::new("http://127.0.0.1:1/verify");

        let user_id = verifier.verify(VALID_TOKEN).await;

        assert_eq!(user_id, Err(Error::InvalidAuthToken));
    }
}
