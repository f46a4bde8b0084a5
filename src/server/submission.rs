use axum::{
    async_trait,
    body::{Body, Bytes},
    extract::{multipart::MultipartError, Form, FromRequest, Multipart, RequestParts},
    http::header::CONTENT_TYPE,
};

use crate::{contact::ContactForm, server::ServerError};

/// Photo attached to a contact form.
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// HTML contact form posted either URL-encoded or as `multipart/form-data`.
pub struct ContactSubmission {
    pub form: ContactForm,
    pub image: Option<Upload>,
}

#[async_trait]
impl FromRequest<Body> for ContactSubmission {
    type Rejection = ServerError;

    async fn from_request(req: &mut RequestParts<Body>) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|header| header.to_str().ok())
            .map_or(false, |header| header.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(form) = Form::<ContactForm>::from_request(req)
                .await
                .map_err(|_rejection| ServerError::BadRequest("Invalid form data".to_owned()))?;

            return Ok(Self { form, image: None });
        }

        let mut multipart = Multipart::from_request(req)
            .await
            .map_err(|_rejection| ServerError::BadRequest("Invalid multipart data".to_owned()))?;

        let mut form = ContactForm::default();
        let mut image = None;

        while let Some(field) = multipart.next_field().await.map_err(bad_field)? {
            let name = field.name().unwrap_or_default().to_owned();

            if name == "image" {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await.map_err(bad_field)?;

                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() {
                    image = Some(Upload { file_name, bytes });
                }

                continue;
            }

            let text = field.text().await.map_err(bad_field)?;

            match name.as_str() {
                "name" => form.name = text,
                "phone" => form.phone = text,
                "email" => form.email = text,
                "type" => form.kind = text,
                "custom_type" => form.custom_type = text,
                _ => (),
            }
        }

        Ok(Self { form, image })
    }
}

fn bad_field(err: MultipartError) -> ServerError {
    ServerError::BadRequest(format!("Invalid multipart data: {}", err))
}
