pub mod api;
pub mod flash;
pub mod images;
pub mod pages;
pub mod submission;

use askama::Template;
use axum::{
    async_trait,
    extract::{Extension, FromRequest, Path, RequestParts},
    http::{header::InvalidHeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::task::JoinError;

use crate::{contact::ValidationError, error::Error, store::Store, uploads::Uploads};

/// Everything a request handler may touch, shared for the lifetime of the process.
pub struct Context {
    pub store: Store,
    pub uploads: Uploads,
}

pub fn router(context: &'static Context) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/contacts", get(pages::list_contacts))
        .route("/add", get(pages::add_form).post(pages::add_contact))
        .route(
            "/update/:id",
            get(pages::update_form).post(pages::update_contact),
        )
        .route("/delete/:id", post(pages::delete_contact))
        .route("/api/contacts", get(api::list).post(api::create))
        .route(
            "/api/contacts/:id",
            get(api::get).put(api::update).delete(api::delete),
        )
        .route("/debug/contacts", get(api::list))
        .route("/static/uploads/:file_name", get(images::image))
        .layer(Extension(context))
}

/// Contact id taken from the route, where anything but an integer names no contact at all.
pub struct ContactId(pub i64);

#[async_trait]
impl<B> FromRequest<B> for ContactId
where
    B: Send,
{
    type Rejection = ServerError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request(req).await.map_err(|rejection| {
            tracing::debug!("Rejected contact id: {:?}", rejection);

            ServerError::NotFound
        })?;

        Ok(Self(id))
    }
}

fn render<P>(page: P) -> Result<Html<String>, ServerError>
where
    P: Template,
{
    Ok(Html(page.render()?))
}

#[derive(Debug)]
pub enum ServerError {
    BadRequest(String),
    NotFound,
    Internal(anyhow::Error),
}

impl From<Error> for ServerError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(err) => err.into(),
            Error::NotFound { .. } => Self::NotFound,
            err => Self::Internal(err.into()),
        }
    }
}

impl From<ValidationError> for ServerError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<askama::Error> for ServerError {
    fn from(err: askama::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl From<JoinError> for ServerError {
    fn from(err: JoinError) -> Self {
        Self::Internal(err.into())
    }
}

impl From<InvalidHeaderValue> for ServerError {
    fn from(err: InvalidHeaderValue) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            Self::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            Self::Internal(err) => {
                tracing::error!("{:#}", err);

                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
