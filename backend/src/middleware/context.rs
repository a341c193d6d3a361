//! Request context extractor
//!
//! Collects the actor and origin of a request for the audit trail. Nothing in
//! here rejects a request: missing pieces simply stay `None`.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use chrono::{DateTime, Utc};

use super::auth::AuthUser;
use crate::services::RequestContext;

pub const CLIENT_TIMESTAMP_HEADER: &str = "x-client-timestamp";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// First address in `X-Forwarded-For`, if any
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_FOR_HEADER)?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .find(|ip| !ip.is_empty())
        .map(str::to_string)
}

fn client_timestamp(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let raw = headers.get(CLIENT_TIMESTAMP_HEADER)?.to_str().ok()?;
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Build the context from request parts
pub fn context_from_parts(parts: &Parts) -> RequestContext {
    let source_ip = forwarded_for(&parts.headers).or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    });

    RequestContext {
        actor_id: parts.extensions.get::<AuthUser>().map(|u| u.employee_id),
        source_ip,
        client_timestamp: client_timestamp(&parts.headers),
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(context_from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use uuid::Uuid;

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn test_forwarded_for_wins_over_peer_address() {
        let mut parts = parts(
            Request::builder()
                .header("X-Forwarded-For", "203.0.113.9, 10.0.0.1")
                .body(())
                .unwrap(),
        );
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        let ctx = context_from_parts(&parts);
        assert_eq!(ctx.source_ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_peer_address_and_actor() {
        let employee_id = Uuid::new_v4();
        let mut parts = parts(Request::builder().body(()).unwrap());
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 20], 4000))));
        parts.extensions.insert(AuthUser {
            employee_id,
            role: "clerk".to_string(),
        });

        let ctx = context_from_parts(&parts);
        assert_eq!(ctx.source_ip.as_deref(), Some("192.168.1.20"));
        assert_eq!(ctx.actor_id, Some(employee_id));
        assert!(ctx.client_timestamp.is_none());
    }

    #[test]
    fn test_client_timestamp_is_parsed() {
        let parts = parts(
            Request::builder()
                .header("X-Client-Timestamp", "2024-05-01T10:30:00+02:00")
                .body(())
                .unwrap(),
        );
        let ts = context_from_parts(&parts).client_timestamp.unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T08:30:00+00:00");
        assert_eq!(context_from_parts(&parts).actor_id, None);
    }
}
