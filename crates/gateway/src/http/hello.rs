use axum::Json;

use super::MessageResponse;

pub const HELLO_MESSAGE: &str = "Hello World";

pub async fn handler() -> Json<MessageResponse> {
    Json(MessageResponse::new(HELLO_MESSAGE))
}
