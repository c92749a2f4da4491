//! Public API types

use axum::response::{IntoResponse, Response};
use http::StatusCode;

// Errors

pub struct ApiError(anyhow::Error);

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Always log the error
        tracing::error!("{}", self.0);

        // Respond with an error status
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Something went wrong: {}", self.0),
        )
            .into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Re-export public types from each route

pub mod conversations {
    pub use crate::api::routes::conversations::public::*;
}

pub mod export {
    pub use crate::api::routes::export::public::*;
}

pub mod files {
    pub use crate::api::routes::files::public::*;
}

pub mod indexes {
    pub use crate::api::routes::indexes::public::*;
}

pub mod query {
    pub use crate::api::routes::query::public::*;
}
