use axum::{
    extract::{Extension, Path},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use tokio::task::spawn_blocking;

use crate::{
    server::{Context, ServerError},
    uploads::content_type,
};

pub async fn image(
    Path(file_name): Path<String>,
    Extension(context): Extension<&'static Context>,
) -> Result<Response, ServerError> {
    let content_type = content_type(&file_name);

    let bytes = spawn_blocking(move || context.uploads.read(&file_name))
        .await??
        .ok_or(ServerError::NotFound)?;

    Ok(([(CONTENT_TYPE, content_type)], bytes).into_response())
}
