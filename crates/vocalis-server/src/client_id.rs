use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use vocalis_config::ClientIpConfig;
use vocalis_core::ClientIdentity;

/// Middleware that resolves the client address used for throttling
///
/// Stores a [`ClientIdentity`] in the request extensions for handlers.
pub async fn client_id_middleware(config: ClientIpConfig, mut request: Request, next: Next) -> Response {
    let identity = resolve_identity(config.trusted_hops, &request);

    request.extensions_mut().insert(identity);

    next.run(request).await
}

fn resolve_identity(trusted_hops: usize, request: &Request) -> ClientIdentity {
    if trusted_hops > 0
        && let Some(ip) = forwarded_client(trusted_hops, request)
    {
        return ClientIdentity::new(ip.to_string());
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(ClientIdentity::unknown, |ConnectInfo(addr)| {
            ClientIdentity::new(addr.ip().to_string())
        })
}

/// Address appended by the outermost trusted proxy
///
/// Each proxy appends the peer it saw, so with `hops` trusted proxies the
/// client is the `hops`-th entry from the right. A shorter chain yields
/// its leftmost entry.
fn forwarded_client(hops: usize, request: &Request) -> Option<IpAddr> {
    let chain: Vec<&str> = request
        .headers()
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();

    let index = chain.len().checked_sub(hops).unwrap_or_default();

    chain.get(index)?.parse().ok()
}
