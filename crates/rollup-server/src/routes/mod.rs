pub mod analytics;
pub mod health;

use crate::error::AppError;

/// Fallback for any path without a route.
pub async fn not_found(uri: axum::http::Uri) -> AppError {
    AppError::not_found(format!("no route {}", uri.path()))
}
