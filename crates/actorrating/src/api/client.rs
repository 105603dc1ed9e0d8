use axum::http::HeaderMap;

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Client identifier used as the rate-limit key: the first
/// `X-Forwarded-For` hop, then `X-Real-IP`, then [`UNKNOWN_CLIENT`].
pub fn client_id(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
