use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::core::catalog::{self, ReadingTypeConfig};
use crate::domain::model::{
    ReadingRecord, ReadingRequest, ReadingResponse, RequestContext, SaveReadingRequest,
};
use crate::utils::error::{ReadingError, Result};

use super::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Client address: the socket peer, or the proxy's view of it when trusted.
pub fn remote_addr(headers: &HeaderMap, peer: SocketAddr, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let forwarded = header_value(headers, "x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if let Some(ip) = forwarded.or_else(|| header_value(headers, "x-real-ip")) {
            return ip.to_string();
        }
    }

    peer.ip().to_string()
}

fn request_context(state: &AppState, headers: &HeaderMap, peer: SocketAddr) -> RequestContext {
    RequestContext::new(
        bearer_token(headers),
        remote_addr(headers, peer, state.trust_proxy_headers),
    )
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| ReadingError::MalformedPayload {
        message: e.to_string(),
    })
}

pub async fn generate_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ReadingResponse>> {
    let request: ReadingRequest = parse_body(&body)?;
    let ctx = request_context(&state, &headers, peer);

    let response = state.service.generate(request, &ctx).await?;
    Ok(Json(response))
}

pub async fn save_reading_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let request: SaveReadingRequest = parse_body(&body)?;
    let ctx = request_context(&state, &headers, peer);

    let record = state.service.save_reading(request, &ctx).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_readings_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<Vec<ReadingRecord>>> {
    let ctx = request_context(&state, &headers, peer);
    Ok(Json(state.service.list_readings(&ctx).await?))
}

pub async fn get_reading_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ReadingRecord>> {
    let ctx = request_context(&state, &headers, peer);
    let id = Uuid::parse_str(&id).map_err(|_| ReadingError::NotFound)?;

    Ok(Json(state.service.get_reading(id, &ctx).await?))
}

pub async fn reading_types_handler() -> Json<&'static [ReadingTypeConfig]> {
    Json(catalog::READING_TYPES.as_slice())
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.10:55000".parse().unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_remote_addr_ignores_proxy_headers_unless_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.7, 10.0.0.1"));

        assert_eq!(remote_addr(&headers, peer(), false), "192.0.2.10");
        assert_eq!(remote_addr(&headers, peer(), true), "198.51.100.7");
    }

    #[test]
    fn test_remote_addr_falls_back_to_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        assert_eq!(remote_addr(&headers, peer(), true), "192.0.2.10");

        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.5"));
        assert_eq!(remote_addr(&headers, peer(), true), "203.0.113.5");
    }
}
