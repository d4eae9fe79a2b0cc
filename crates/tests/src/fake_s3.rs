use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::Response;
use parking_lot::Mutex;

use crate::{respond, sha256_digest, spawn};

type Objects = Arc<Mutex<HashMap<(String, String), Vec<u8>>>>;

/// Path-style S3 endpoint that accepts `PUT /{bucket}/{key}` and ignores
/// request signatures.
#[derive(Clone)]
pub struct FakeObjectStore {
    addr: SocketAddr,
    objects: Objects,
}

impl FakeObjectStore {
    pub async fn start() -> Result<Self> {
        let objects: Objects = Arc::default();
        let router = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&objects));
        let addr = spawn(router).await?;
        Ok(Self { addr, objects })
    }

    /// Endpoint in the bare `host:port` form found in cluster secrets.
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn handle(
    State(objects): State<Objects>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri.path().trim_start_matches('/');
    let Some((bucket, key)) = path.split_once('/') else {
        return respond(StatusCode::NOT_FOUND, &[], Vec::new());
    };
    if method != Method::PUT || key.is_empty() {
        return respond(StatusCode::NOT_IMPLEMENTED, &[], Vec::new());
    }

    let etag = format!("\"{}\"", sha256_digest(&body));
    objects
        .lock()
        .insert((bucket.to_string(), key.to_string()), body.to_vec());
    respond(StatusCode::OK, &[("etag", etag)], Vec::new())
}
