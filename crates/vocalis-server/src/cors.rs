use std::str::FromStr;

use http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use vocalis_config::{AnyOrList, CorsConfig};

/// Build a Tower CORS layer from configuration
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = match &config.origins {
        AnyOrList::Any => AllowOrigin::any(),
        AnyOrList::List(values) => AllowOrigin::list(parse_all::<HeaderValue>("origin", values)),
    };

    let methods = match &config.methods {
        AnyOrList::Any => AllowMethods::any(),
        AnyOrList::List(values) => AllowMethods::list(parse_all::<Method>("method", values)),
    };

    let headers = match &config.headers {
        AnyOrList::Any => AllowHeaders::any(),
        AnyOrList::List(values) => AllowHeaders::list(parse_all::<HeaderName>("header", values)),
    };

    let layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers);

    match config.max_age_duration() {
        Some(max_age) => layer.max_age(max_age),
        None => layer,
    }
}

/// Parse every entry, skipping (and reporting) the ones that do not parse
fn parse_all<T: FromStr>(kind: &str, values: &[String]) -> Vec<T> {
    values
        .iter()
        .filter_map(|value| {
            let parsed = value.parse().ok();
            if parsed.is_none() {
                tracing::warn!("ignoring invalid CORS {kind}: {value}");
            }
            parsed
        })
        .collect()
}
