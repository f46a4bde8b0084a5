use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
};
use tokio::task::spawn_blocking;

use crate::{
    contact::{Contact, ContactPayload},
    error::Error,
    server::{ContactId, Context, ServerError},
};

pub async fn list(
    Extension(context): Extension<&'static Context>,
) -> Result<Json<Vec<Contact>>, ServerError> {
    let contacts = spawn_blocking(move || context.store.list()).await??;

    Ok(Json(contacts))
}

pub async fn get(
    ContactId(id): ContactId,
    Extension(context): Extension<&'static Context>,
) -> Result<Json<Contact>, ServerError> {
    let contact = spawn_blocking(move || context.store.get(id)).await??;

    Ok(Json(contact))
}

pub async fn create(
    Extension(context): Extension<&'static Context>,
    payload: Result<Json<ContactPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Contact>), ServerError> {
    let Json(payload) = payload.map_err(bad_json)?;

    let (fields, image_url) = payload.into_fields()?;

    let contact = spawn_blocking(move || context.store.create(fields, image_url)).await??;

    tracing::info!("Created contact {} via API", contact.id);

    Ok((StatusCode::CREATED, Json(contact)))
}

/// Partial update: keys missing from the body keep their stored value.
pub async fn update(
    ContactId(id): ContactId,
    Extension(context): Extension<&'static Context>,
    payload: Result<Json<ContactPayload>, JsonRejection>,
) -> Result<Json<Contact>, ServerError> {
    let Json(payload) = payload.map_err(bad_json)?;

    let contact = spawn_blocking(move || {
        context
            .store
            .modify(id, |contact| payload.apply(contact).map_err(Error::from))
    })
    .await??;

    tracing::info!("Updated contact {} via API", contact.id);

    Ok(Json(contact))
}

pub async fn delete(
    ContactId(id): ContactId,
    Extension(context): Extension<&'static Context>,
) -> Result<StatusCode, ServerError> {
    spawn_blocking(move || context.store.delete(id)).await??;

    tracing::info!("Deleted contact {} via API", id);

    Ok(StatusCode::NO_CONTENT)
}

fn bad_json(rejection: JsonRejection) -> ServerError {
    tracing::debug!("Rejected JSON body: {:?}", rejection);

    ServerError::BadRequest("Invalid JSON body".to_owned())
}
