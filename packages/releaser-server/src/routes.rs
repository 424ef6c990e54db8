use crate::response::{self, Body};
use crate::static_files;
use bytes::Bytes;
use hyper::header::ACCESS_CONTROL_REQUEST_HEADERS;
use hyper::{Method, Request, Response, StatusCode};
use releaser_core::{ErrorKind, PublishRequest, ReleaseRecord, ReleaseService};
use serde_json::json;
use std::path::PathBuf;

pub const LATEST_PATH: &str = "/api/updates/latest";
pub const VERSION_PREFIX: &str = "/api/updates/version/";
pub const PUBLISH_PATH: &str = "/api/admin/publish";

/// Everything a request handler needs.
pub struct AppState {
    pub service: ReleaseService,
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(service: ReleaseService, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            public_dir: public_dir.into(),
        }
    }
}

/// Dispatch one buffered request and decorate the response with CORS headers.
pub async fn handle(state: &AppState, req: Request<Bytes>) -> Response<Body> {
    let mut response = if *req.method() == Method::OPTIONS {
        response::preflight(req.headers().get(ACCESS_CONTROL_REQUEST_HEADERS))
    } else {
        route(state, req.method(), req.uri().path(), req.body()).await
    };
    response::allow_any_origin(&mut response);
    response
}

/// Reply for a request whose body exceeded the size limit.
pub fn payload_too_large() -> Response<Body> {
    let mut response = response::error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
    response::allow_any_origin(&mut response);
    response
}

async fn route(state: &AppState, method: &Method, path: &str, body: &Bytes) -> Response<Body> {
    let api_path = match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    };
    let is_read = *method == Method::GET || *method == Method::HEAD;

    if is_read && api_path == LATEST_PATH {
        return latest(state).await;
    }
    if is_read {
        if let Some(raw) = api_path.strip_prefix(VERSION_PREFIX) {
            if !raw.is_empty() && !raw.contains('/') {
                return version(state, raw).await;
            }
        }
    }
    if *method == Method::POST && api_path == PUBLISH_PATH {
        return publish(state, body).await;
    }
    if is_read {
        if let Some(response) = static_file(state, path).await {
            return response;
        }
    }
    response::error(StatusCode::NOT_FOUND, "Not Found")
}

fn record_response(record: &ReleaseRecord) -> Result<Response<Body>, serde_json::Error> {
    let value = serde_json::to_value(record)?;
    Ok(response::json(StatusCode::OK, &value))
}

async fn latest(state: &AppState) -> Response<Body> {
    let failure = || {
        response::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch release information",
        )
    };
    match state.service.latest().await {
        Ok(record) => record_response(&record).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Error encoding latest release");
            failure()
        }),
        Err(e) if e.is_not_found() => {
            response::error(StatusCode::NOT_FOUND, "No release information found")
        }
        Err(e) => {
            tracing::error!(error = %e, "Error fetching latest release");
            failure()
        }
    }
}

async fn version(state: &AppState, raw: &str) -> Response<Body> {
    let version = match urlencoding::decode(raw) {
        Ok(version) => version.into_owned(),
        Err(_) => raw.to_string(),
    };
    let failure = || {
        response::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch version information",
        )
    };
    match state.service.version(&version).await {
        Ok(record) => record_response(&record).unwrap_or_else(|e| {
            tracing::error!(version = %version, error = %e, "Error encoding version");
            failure()
        }),
        Err(e) if e.is_not_found() => response::error(
            StatusCode::NOT_FOUND,
            &format!("Version {} not found", version),
        ),
        Err(e) => {
            tracing::error!(version = %version, error = %e, "Error fetching version");
            failure()
        }
    }
}

async fn publish(state: &AppState, body: &Bytes) -> Response<Body> {
    let request: PublishRequest = if body.iter().all(u8::is_ascii_whitespace) {
        PublishRequest::default()
    } else {
        match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "rejected publish body");
                return response::error(StatusCode::BAD_REQUEST, "Invalid JSON body");
            }
        }
    };

    match state.service.publish(request).await {
        Ok(version) => response::json(
            StatusCode::OK,
            &json!({
                "success": true,
                "message": format!("Published version {}", version),
            }),
        ),
        Err(e) if e.kind() == ErrorKind::Validation => {
            response::error(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "Error publishing release");
            response::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to publish release")
        }
    }
}

async fn static_file(state: &AppState, path: &str) -> Option<Response<Body>> {
    match static_files::load(&state.public_dir, path).await {
        Ok(Some((data, content_type))) => {
            Some(response::bytes(StatusCode::OK, content_type, data))
        }
        Ok(None) => None,
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Error reading static file");
            Some(response::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read file",
            ))
        }
    }
}
