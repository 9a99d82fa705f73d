//! HTTP surface: the download form page, the download endpoints and
//! `/video-details`, mounted at `/` and again under `/api`.

pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{router, run_server, AppState};
