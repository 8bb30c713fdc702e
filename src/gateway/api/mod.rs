pub mod clone;
pub mod types;

use axum::Router;
use crate::gateway::AppState;

pub fn routes(max_upload_bytes: Option<usize>) -> Router<AppState> {
    Router::new().merge(clone::router(max_upload_bytes))
}
