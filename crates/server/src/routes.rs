//! Request routing and error mapping.

use std::sync::Arc;

use hyper::body::HttpBody;
use hyper::{Body, Method, Request, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;

use chunkport_protocol::{
    ErrorKind, ErrorResponse, HEADER_CHUNK_HASH, HEADER_FILE_HASH, MergeRequest, MergeResponse,
    UploadChunkResponse, VerifyRequest, VerifyResponse,
};
use chunkport_service::{ServiceError, StoreError, UploadService};

/// Upper bound on JSON request bodies. Chunk payloads have their own limit.
const MAX_JSON_BODY: usize = 64 * 1024;

/// Dispatches one request to the matching operation.
pub async fn handle(req: Request<Body>, service: Arc<UploadService>) -> Response<Body> {
    match (req.method(), req.uri().path()) {
        (&Method::POST, "/api/verify") => verify(req, service).await,
        (&Method::POST, "/api/upload") => upload(req, service).await,
        (&Method::POST, "/api/merge") => merge(req, service).await,
        _ => text_response(StatusCode::NOT_FOUND, "not found"),
    }
}

async fn verify(req: Request<Body>, service: Arc<UploadService>) -> Response<Body> {
    let body: VerifyRequest = match read_json(req).await {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    match service.verify(&body.hash, &body.filename).await {
        Ok(state) => json_response(
            StatusCode::OK,
            &VerifyResponse {
                complete: state.complete,
                present_chunk_ids: state.present_chunk_ids,
            },
        ),
        Err(e) => service_error_response(&e),
    }
}

async fn upload(req: Request<Body>, service: Arc<UploadService>) -> Response<Body> {
    let Some(upload_id) = header_value(&req, HEADER_FILE_HASH) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorKind::InvalidIdentifier,
            "no file hash provided",
        );
    };
    let Some(chunk_id) = header_value(&req, HEADER_CHUNK_HASH) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorKind::InvalidIdentifier,
            "no chunk hash provided",
        );
    };

    let limit = service.store().max_chunk_size();
    let bytes = match read_body(req, limit, ErrorKind::ChunkTooLarge).await {
        Ok(bytes) => bytes,
        Err(resp) => return resp,
    };

    match service.upload_chunk(&upload_id, &chunk_id, bytes).await {
        Ok(path) => json_response(
            StatusCode::OK,
            &UploadChunkResponse {
                path: path.to_string_lossy().into_owned(),
            },
        ),
        Err(e) => service_error_response(&e),
    }
}

async fn merge(req: Request<Body>, service: Arc<UploadService>) -> Response<Body> {
    let body: MergeRequest = match read_json(req).await {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    match service.merge(&body.hash, &body.filename).await {
        Ok(path) => json_response(
            StatusCode::OK,
            &MergeResponse {
                path: path.to_string_lossy().into_owned(),
            },
        ),
        Err(e) => service_error_response(&e),
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn header_value(req: &Request<Body>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Reads the request body, rejecting payloads above `limit` with a
/// `kind` envelope as soon as the limit is crossed. Streamed bodies are
/// consumed frame by frame, so an oversized stream is refused without
/// buffering it whole.
async fn read_body(
    req: Request<Body>,
    limit: usize,
    kind: ErrorKind,
) -> Result<Vec<u8>, Response<Body>> {
    // Content-Length lets us refuse oversized payloads without reading them.
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Some(len) = declared
        && len > limit
    {
        return Err(too_large(kind, len, limit));
    }

    let mut body = req.into_body();
    let mut bytes = Vec::with_capacity(declared.unwrap_or(0).min(limit));
    while let Some(frame) = body.data().await {
        let frame = frame
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, ErrorKind::Io, &e.to_string()))?;
        if bytes.len() + frame.len() > limit {
            return Err(too_large(kind, bytes.len() + frame.len(), limit));
        }
        bytes.extend_from_slice(&frame);
    }
    Ok(bytes)
}

async fn read_json<T: DeserializeOwned>(req: Request<Body>) -> Result<T, Response<Body>> {
    let bytes = read_body(req, MAX_JSON_BODY, ErrorKind::Io).await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            ErrorKind::MissingParameter,
            &format!("invalid request body: {e}"),
        )
    })
}

fn too_large(kind: ErrorKind, size: usize, limit: usize) -> Response<Body> {
    error_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        kind,
        &format!("payload of {size} bytes exceeds the {limit} byte limit"),
    )
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    let buf = serde_json::to_vec(body).unwrap_or_default();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(buf))
        .unwrap()
}

fn text_response(status: StatusCode, message: &str) -> Response<Body> {
    Response::builder()
        .status(status)
        .body(Body::from(message.to_owned()))
        .unwrap()
}

fn error_response(status: StatusCode, error: ErrorKind, message: &str) -> Response<Body> {
    json_response(
        status,
        &ErrorResponse {
            error,
            message: message.to_owned(),
        },
    )
}

fn service_error_response(err: &ServiceError) -> Response<Body> {
    let (status, kind) = match err {
        ServiceError::Store(e) => match e {
            StoreError::MissingParameter(_) => (StatusCode::BAD_REQUEST, ErrorKind::MissingParameter),
            StoreError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, ErrorKind::InvalidIdentifier),
            StoreError::ChunkTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, ErrorKind::ChunkTooLarge),
            StoreError::StorageUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::StorageUnavailable)
            }
            StoreError::ChunkDirectoryNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorKind::ChunkDirectoryNotFound)
            }
            StoreError::MalformedChunkIdentifier(_) => {
                (StatusCode::BAD_REQUEST, ErrorKind::MalformedChunkIdentifier)
            }
            StoreError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Io),
        },
        ServiceError::MergeInProgress(_) => (StatusCode::CONFLICT, ErrorKind::MergeInProgress),
        ServiceError::MergeTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, ErrorKind::MergeTimeout),
        ServiceError::Task(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Io),
    };
    if status.is_server_error() {
        tracing::error!(%err, "request failed");
    } else {
        tracing::warn!(%err, "request rejected");
    }
    error_response(status, kind, &err.to_string())
}
