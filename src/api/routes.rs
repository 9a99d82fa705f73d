//! Route handlers.
//!
//! Handlers only validate the query and hand off to the [`StreamRelay`].

use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::response::{Html, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::downloader::OutputKind;
use crate::relay::{DownloadRequest, FileNaming, VideoDetails};

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
    /// `mp4`/`video` or `mp3`/`audio`; absent means video
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailsQuery {
    pub url: Option<String>,
}

/// `Query` whose rejection is reported as a JSON [`ApiError`]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                ApiError::bad_request("Invalid query string").with_details(e.body_text())
            })?;
        Ok(Self(value))
    }
}

const INDEX_HTML: &str = include_str!("index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /download?url=&format=` - file named after the kind (`audio.mp3`)
pub async fn download(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DownloadQuery>,
) -> ApiResult<Response> {
    let request = DownloadRequest::from_query(
        query.url.as_deref(),
        query.format.as_deref(),
        FileNaming::Mapped,
    )?;
    state.relay.handle_download(request).await
}

/// `GET /download/audio?url=` - file named after the container (`audio.webm`)
pub async fn download_audio(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DownloadQuery>,
) -> ApiResult<Response> {
    fixed_kind(state, query, OutputKind::Audio).await
}

/// `GET /download/video?url=`
pub async fn download_video(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DownloadQuery>,
) -> ApiResult<Response> {
    fixed_kind(state, query, OutputKind::Video).await
}

async fn fixed_kind(
    state: AppState,
    query: DownloadQuery,
    kind: OutputKind,
) -> ApiResult<Response> {
    let request =
        DownloadRequest::for_kind(query.url.as_deref(), kind, FileNaming::Container)?;
    state.relay.handle_download(request).await
}

/// `GET /video-details?url=` - `{title, thumbnail}`
pub async fn video_details(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DetailsQuery>,
) -> ApiResult<Json<VideoDetails>> {
    let details = state.relay.handle_details(query.url.as_deref()).await?;
    Ok(Json(details))
}
