use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::Response;
use parking_lot::Mutex;
use tokio::net::TcpListener;

use crate::{respond, sha256_digest, spawn_on};

/// Minimal OCI distribution endpoint: monolithic and chunked blob uploads,
/// manifest push and fetch. Access is anonymous unless started with
/// [`FakeRegistry::start_with_authorization`].
#[derive(Clone)]
pub struct FakeRegistry {
    host: String,
    inner: Arc<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    base: String,
    required_authorization: Option<String>,
    data: Mutex<RegistryData>,
}

#[derive(Default)]
struct RegistryData {
    next_upload: u64,
    uploads: HashMap<String, Vec<u8>>,
    blobs: HashMap<String, Vec<u8>>,
    manifests: HashMap<(String, String), StoredManifest>,
    authorizations: Vec<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct StoredManifest {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FakeRegistry {
    pub async fn start() -> Result<Self> {
        Self::launch(None).await
    }

    /// Answers every request lacking exactly `authorization` with a `401` and
    /// a `Basic` challenge.
    pub async fn start_with_authorization(authorization: &str) -> Result<Self> {
        Self::launch(Some(authorization.to_string())).await
    }

    async fn launch(required_authorization: Option<String>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let host = listener.local_addr()?.to_string();
        let inner = Arc::new(RegistryState {
            base: format!("http://{host}"),
            required_authorization,
            data: Mutex::default(),
        });
        let router = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&inner));
        spawn_on(listener, router)?;
        Ok(Self { host, inner })
    }

    /// Registry host in the `host:port` form used for `REGISTRY`.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn manifest(&self, repository: &str, reference: &str) -> Option<StoredManifest> {
        self.inner
            .data
            .lock()
            .manifests
            .get(&(repository.to_string(), reference.to_string()))
            .cloned()
    }

    pub fn blob(&self, digest: &str) -> Option<Vec<u8>> {
        self.inner.data.lock().blobs.get(digest).cloned()
    }

    /// `Authorization` header of every request received, in arrival order.
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.inner.data.lock().authorizations.clone()
    }
}

async fn handle(
    State(state): State<Arc<RegistryState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.data.lock().authorizations.push(authorization.clone());
    if let Some(required) = &state.required_authorization {
        if authorization.as_ref() != Some(required) {
            return respond(
                StatusCode::UNAUTHORIZED,
                &[(
                    "www-authenticate",
                    "Basic realm=\"fake-registry\"".to_string(),
                )],
                Vec::new(),
            );
        }
    }

    let path = uri.path();
    if path == "/v2" || path == "/v2/" {
        return respond(StatusCode::OK, &[], b"{}".to_vec());
    }
    let Some(rest) = path.strip_prefix("/v2/") else {
        return respond(StatusCode::NOT_FOUND, &[], Vec::new());
    };
    let digest = query_digest(&uri);

    if let Some((repo, id)) = rest.split_once("/blobs/uploads") {
        let id = id.trim_start_matches('/');
        return upload(&state, &method, repo, id, digest, &body);
    }
    if let Some((_repo, digest)) = rest.split_once("/blobs/") {
        let data = state.data.lock().blobs.get(digest).cloned();
        return match data {
            Some(data) => {
                let headers = [
                    ("docker-content-digest", digest.to_string()),
                    ("content-length", data.len().to_string()),
                ];
                let body = if method == Method::HEAD { Vec::new() } else { data };
                respond(StatusCode::OK, &headers, body)
            }
            None => respond(StatusCode::NOT_FOUND, &[], Vec::new()),
        };
    }
    if let Some((repo, reference)) = rest.split_once("/manifests/") {
        let key = (repo.to_string(), reference.to_string());
        if method == Method::PUT {
            let digest = sha256_digest(&body);
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            state.data.lock().manifests.insert(
                key,
                StoredManifest {
                    content_type,
                    body: body.to_vec(),
                },
            );
            let location = format!("{}/v2/{repo}/manifests/{reference}", state.base);
            return respond(
                StatusCode::CREATED,
                &[("location", location), ("docker-content-digest", digest)],
                Vec::new(),
            );
        }
        let manifest = state.data.lock().manifests.get(&key).cloned();
        return match manifest {
            Some(manifest) => {
                let mut headers = vec![("docker-content-digest", sha256_digest(&manifest.body))];
                if let Some(content_type) = manifest.content_type {
                    headers.push(("content-type", content_type));
                }
                respond(StatusCode::OK, &headers, manifest.body)
            }
            None => respond(StatusCode::NOT_FOUND, &[], Vec::new()),
        };
    }
    respond(StatusCode::NOT_FOUND, &[], Vec::new())
}

fn upload(
    state: &RegistryState,
    method: &Method,
    repo: &str,
    id: &str,
    digest: Option<String>,
    body: &[u8],
) -> Response {
    let mut data = state.data.lock();
    let id = if id.is_empty() {
        if *method != Method::POST {
            return respond(StatusCode::METHOD_NOT_ALLOWED, &[], Vec::new());
        }
        data.next_upload += 1;
        let id = format!("upload-{}", data.next_upload);
        data.uploads.insert(id.clone(), Vec::new());
        id
    } else {
        id.to_string()
    };

    let Some(buffer) = data.uploads.get_mut(&id) else {
        return respond(StatusCode::NOT_FOUND, &[], Vec::new());
    };
    buffer.extend_from_slice(body);

    match digest {
        Some(digest) if *method == Method::PUT || *method == Method::POST => {
            let content = data.uploads.remove(&id).unwrap_or_default();
            if sha256_digest(&content) != digest {
                return respond(StatusCode::BAD_REQUEST, &[], b"digest mismatch".to_vec());
            }
            data.blobs.insert(digest.clone(), content);
            let location = format!("{}/v2/{repo}/blobs/{digest}", state.base);
            respond(
                StatusCode::CREATED,
                &[("location", location), ("docker-content-digest", digest)],
                Vec::new(),
            )
        }
        _ => {
            let len = data.uploads.get(&id).map(Vec::len).unwrap_or_default();
            let location = format!("{}/v2/{repo}/blobs/uploads/{id}", state.base);
            respond(
                StatusCode::ACCEPTED,
                &[
                    ("location", location),
                    ("range", format!("0-{}", len.saturating_sub(1))),
                    ("docker-upload-uuid", id),
                ],
                Vec::new(),
            )
        }
    }
}

fn query_digest(uri: &Uri) -> Option<String> {
    uri.query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("digest="))
        .map(|value| value.replace("%3A", ":").replace("%3a", ":"))
}
