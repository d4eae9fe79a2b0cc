use axum::http::header;
use axum::response::IntoResponse;

pub const OPENAPI_DOCUMENT: &str = include_str!("../../api/openapi.yaml");

pub async fn openapi() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/yaml")], OPENAPI_DOCUMENT)
}
