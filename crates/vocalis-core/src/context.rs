use std::{convert::Infallible, fmt, net::SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use http::request::Parts;

/// Identity of the caller used as the throttling key
///
/// Resolved once per request by the server middleware from the peer
/// address or a trusted `X-Forwarded-For` hop, then stored in the
/// request extensions for handlers to pick up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    /// Network address string (e.g. "203.0.113.7")
    pub client_id: String,
}

impl ClientIdentity {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }

    /// Identity used when no address could be resolved
    pub fn unknown() -> Self {
        Self::new("unknown")
    }

    pub fn as_str(&self) -> &str {
        &self.client_id
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.client_id)
    }
}

/// Handlers take the identity the middleware resolved; without the
/// middleware it falls back to the peer address, then to `unknown`.
impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Self>() {
            return Ok(identity.clone());
        }

        Ok(parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(Self::unknown, |ConnectInfo(addr)| Self::new(addr.ip().to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn extract(request: http::Request<()>) -> ClientIdentity {
        let (mut parts, ()) = request.into_parts();
        ClientIdentity::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn prefers_resolved_identity() {
        let mut request = http::Request::new(());
        request.extensions_mut().insert(ClientIdentity::new("198.51.100.4"));
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000))));

        assert_eq!(extract(request).await.as_str(), "198.51.100.4");
    }

    #[tokio::test]
    async fn falls_back_to_peer_ip() {
        let mut request = http::Request::new(());
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000))));

        assert_eq!(extract(request).await.as_str(), "10.0.0.1");
    }

    #[tokio::test]
    async fn unknown_without_any_address() {
        assert_eq!(extract(http::Request::new(())).await, ClientIdentity::unknown());
    }
}
