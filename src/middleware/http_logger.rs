use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use std::collections::BTreeMap;
use std::time::Instant;

/// Maximum size of an error response body kept in a breadcrumb
const ERROR_BODY_LIMIT: usize = 4 * 1024;

const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-goog-api-key",
];

/// Logs every request and records it as a Sentry breadcrumb.
/// Bodies are only captured for error responses, and only when they are JSON.
pub async fn http_logging_middleware(
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_headers = extract_safe_headers(req.headers());

    let res = next.run(req).await;

    let status = res.status();
    let duration_ms = start.elapsed().as_millis() as u64;

    if status.as_u16() < 400 {
        tracing::info!("{method} {path} {} ({duration_ms}ms)", status.as_u16());
        add_breadcrumb(method.as_str(), &path, status.as_u16(), duration_ms, None);
        return Ok(res);
    }

    let is_json = res
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));

    let (res, body) = if is_json {
        match buffer_response_body(res).await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Failed to buffer response body: {}", e);
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process response".to_string(),
                ));
            }
        }
    } else {
        (res, None)
    };

    let body_preview = body.as_ref().map(|b| String::from_utf8_lossy(b).into_owned());
    tracing::warn!(
        headers = ?request_headers,
        "{method} {path} {} ({duration_ms}ms): {}",
        status.as_u16(),
        body_preview.as_deref().unwrap_or("")
    );
    add_breadcrumb(
        method.as_str(),
        &path,
        status.as_u16(),
        duration_ms,
        body_preview.as_deref(),
    );

    Ok(res)
}

/// Buffer response body bytes and reconstruct the response
async fn buffer_response_body(
    res: Response,
) -> Result<(Response, Option<Bytes>), Box<dyn std::error::Error>> {
    let (parts, body) = res.into_parts();

    let bytes = body
        .collect()
        .await
        .map_err(|e| format!("Failed to read response body: {}", e))?
        .to_bytes();

    let bytes_to_store = if bytes.is_empty() {
        None
    } else {
        Some(bytes.slice(0..bytes.len().min(ERROR_BODY_LIMIT)))
    };

    Ok((Response::from_parts(parts, Body::from(bytes)), bytes_to_store))
}

/// Extract safe headers (excluding sensitive ones)
fn extract_safe_headers(headers: &http::HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let name = name.as_str().to_lowercase();
            if SENSITIVE_HEADERS.contains(&name.as_str()) {
                Some((name, "[REDACTED]".to_string()))
            } else {
                value.to_str().ok().map(|v| (name, v.to_string()))
            }
        })
        .collect()
}

fn add_breadcrumb(
    method: &str,
    path: &str,
    status: u16,
    duration_ms: u64,
    body_preview: Option<&str>,
) {
    let mut data = BTreeMap::new();
    data.insert("method".to_string(), serde_json::json!(method));
    data.insert("url".to_string(), serde_json::json!(path));
    data.insert("status_code".to_string(), serde_json::json!(status));
    data.insert("duration_ms".to_string(), serde_json::json!(duration_ms));
    if let Some(body) = body_preview {
        data.insert("body".to_string(), serde_json::json!(body));
    }

    let level = if status >= 500 {
        sentry::Level::Error
    } else if status >= 400 {
        sentry::Level::Warning
    } else {
        sentry::Level::Info
    };

    sentry::add_breadcrumb(sentry::Breadcrumb {
        ty: "http".to_string(),
        category: Some("http.request".to_string()),
        message: Some(format!("{method} {path} {status} ({duration_ms}ms)")),
        data: data.into_iter().collect(),
        level,
        ..Default::default()
    });
}
