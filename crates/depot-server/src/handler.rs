//! Artifact endpoint routing.
//!
//! `HEAD`, `GET` and `PUT` under [`ARTIFACT_PREFIX`] map onto
//! [`Repository::exists`](depot_store::Repository::exists),
//! [`Repository::open`](depot_store::Repository::open) and
//! [`Repository::store`](depot_store::Repository::store). `GET /health`
//! reports liveness; every other path is a 404.

use crate::access::AccessRequest;
use crate::ServerState;
use depot_coordinate::{parse_coordinate, Coordinate};
use depot_store::StoreError;
use std::fs::File;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{debug, error, info, warn};

/// URL prefix of the artifact endpoint. Stripped before coordinate parsing.
pub const ARTIFACT_PREFIX: &str = "/artifact";
/// The only content type accepted for uploads.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Strip [`ARTIFACT_PREFIX`] from a request path. `None` when the path is
/// outside the artifact endpoint.
pub fn strip_artifact_prefix(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(ARTIFACT_PREFIX)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

/// Status code for a failed store operation.
pub fn store_error_status(err: &StoreError) -> u16 {
    match err {
        StoreError::UnsafeSegment(_) => 400,
        StoreError::Fallback(_) => 502,
        StoreError::Io { .. } => 500,
    }
}

fn header_value<'r>(req: &'r Request, name: &'static str) -> Option<&'r str> {
    req.headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str())
}

fn respond_err(req: Request, code: u16, msg: &str) {
    let _ = req.respond(Response::from_string(msg).with_status_code(StatusCode(code)));
}

fn respond_octet(req: Request, file: File) {
    let mut response = Response::from_file(file);
    if let Ok(header) = Header::from_bytes("Content-Type", OCTET_STREAM) {
        response.add_header(header);
    }
    let _ = req.respond(response);
}

fn respond_json(req: Request, json: &serde_json::Value) {
    let mut response = Response::from_string(json.to_string());
    if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
        response.add_header(header);
    }
    let _ = req.respond(response);
}

fn respond_store_error(req: Request, coordinate: &Coordinate, err: &StoreError) {
    let code = store_error_status(err);
    if code == 400 {
        warn!(
            group = coordinate.group(),
            artifact = coordinate.artifact(),
            version = coordinate.version(),
            file = coordinate.file_name(),
            "rejecting request: {err}"
        );
    } else {
        error!(
            group = coordinate.group(),
            artifact = coordinate.artifact(),
            version = coordinate.version(),
            file = coordinate.file_name(),
            status = code,
            "storage failure: {err}"
        );
    }
    respond_err(req, code, &err.to_string());
}

/// Why an upload must be refused before touching the store, if it must.
fn validate_upload(req: &Request) -> Option<&'static str> {
    if header_value(req, "Content-Type") != Some(OCTET_STREAM) {
        return Some("content type must be application/octet-stream");
    }
    match req.body_length() {
        Some(n) if n > 0 => None,
        _ => Some("a non-zero content length is required"),
    }
}

fn handle_head(state: &ServerState, req: Request, coordinate: &Coordinate) {
    match state.repository().exists(coordinate) {
        Ok(found) => {
            let code = if found { 200 } else { 404 };
            let _ = req.respond(Response::empty(code));
        }
        Err(e) => respond_store_error(req, coordinate, &e),
    }
}

fn handle_get(state: &ServerState, req: Request, coordinate: &Coordinate) {
    match state.repository().open(coordinate) {
        Ok(Some(file)) => respond_octet(req, file),
        Ok(None) => respond_err(req, 404, "not found"),
        Err(e) => respond_store_error(req, coordinate, &e),
    }
}

fn handle_put(state: &ServerState, mut req: Request, coordinate: &Coordinate) {
    if let Some(reason) = validate_upload(&req) {
        warn!("rejecting PUT {coordinate}: {reason}");
        respond_err(req, 400, reason);
        return;
    }
    match state.repository().store(coordinate, req.as_reader()) {
        Ok(bytes) => {
            info!("PUT {coordinate}: {bytes} bytes");
            let _ = req.respond(Response::from_string("ok"));
        }
        Err(e) => respond_store_error(req, coordinate, &e),
    }
}

/// Handle a single HTTP request.
pub fn handle_request(state: &ServerState, req: Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    let path = url.split_once('?').map_or(url.as_str(), |(p, _)| p);
    if path == "/health" {
        if method == Method::Get {
            respond_json(req, &serde_json::json!({ "status": "ok" }));
        } else {
            respond_err(req, 405, "method not allowed");
        }
        return;
    }

    let Some(artifact_path) = strip_artifact_prefix(path) else {
        respond_err(req, 404, "not found");
        return;
    };

    let access = AccessRequest {
        method: method.as_str(),
        path: artifact_path,
        authorization: header_value(&req, "Authorization"),
        remote_addr: req.remote_addr().copied(),
    };
    if !state.access_policy().permits(&access) {
        warn!("access denied: {method} {url}");
        respond_err(req, 401, "unauthorized");
        return;
    }

    let coordinate = match parse_coordinate(artifact_path) {
        Ok(c) => c,
        Err(e) => {
            warn!("malformed artifact request {method} {url}: {e}");
            respond_err(req, 400, &e.to_string());
            return;
        }
    };

    match method {
        Method::Head => handle_head(state, req, &coordinate),
        Method::Get => handle_get(state, req, &coordinate),
        Method::Put => handle_put(state, req, &coordinate),
        _ => {
            warn!("unsupported method {method} for {url}");
            respond_err(req, 400, "unsupported method");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn strips_artifact_prefix() {
        assert_eq!(
            strip_artifact_prefix("/artifact/org/a/1.0/a.jar"),
            Some("/org/a/1.0/a.jar")
        );
        assert_eq!(strip_artifact_prefix("/artifact"), Some(""));
        assert_eq!(strip_artifact_prefix("/artifact/"), Some("/"));
    }

    #[test]
    fn other_prefixes_are_not_artifacts() {
        assert_eq!(strip_artifact_prefix("/artifactory/org/a"), None);
        assert_eq!(strip_artifact_prefix("/health"), None);
        assert_eq!(strip_artifact_prefix("/"), None);
    }

    #[test]
    fn store_errors_map_to_distinct_codes() {
        assert_eq!(
            store_error_status(&StoreError::UnsafeSegment("..".to_owned())),
            400
        );
        assert_eq!(
            store_error_status(&StoreError::Fallback("down".to_owned())),
            502
        );
        assert_eq!(
            store_error_status(&StoreError::Io {
                path: PathBuf::from("/r"),
                source: io::Error::other("disk full"),
            }),
            500
        );
    }
}
