use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Embed)]
#[folder = "assets/"]
struct Assets;

fn file_response(path: &str, data: Vec<u8>, cache_control: &'static str) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, cache_control.to_string()),
        ],
        data,
    )
        .into_response()
}

/// GET /static/{*path}: stylesheets and other files built into the binary
pub async fn serve_static(Path(path): Path<String>) -> AppResult<Response> {
    let file = Assets::get(&path).ok_or(AppError::NotFound)?;
    Ok(file_response(
        &path,
        file.data.to_vec(),
        "public, max-age=86400",
    ))
}

/// GET /media/{*path}: uploaded post images
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<Response> {
    let file = state.media.resolve(&path).ok_or(AppError::NotFound)?;
    let data = match tokio::fs::read(&file).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };
    Ok(file_response(&path, data, "public, max-age=3600"))
}
