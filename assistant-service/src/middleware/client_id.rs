use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

/// Caller identity for the usage gate.
///
/// Taken from the `X-User-ID` header when a front-end propagates one;
/// anonymous otherwise. Multi-user isolation is out of scope, so the
/// identity is attribution input for the quota capability, not an
/// authentication mechanism.
#[derive(Debug, Clone)]
pub struct ClientId(pub String);

const ANONYMOUS: &str = "anonymous";

#[async_trait]
impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let client_id = parts
            .headers
            .get("X-User-ID")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(ANONYMOUS);

        tracing::Span::current().record("user_id", client_id);

        Ok(ClientId(client_id.to_string()))
    }
}
