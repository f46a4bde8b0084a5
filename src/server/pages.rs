use askama::Template;
use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
};
use tokio::task::spawn_blocking;

use crate::{
    contact::{Category, Contact, ContactForm, FieldError},
    error::Error,
    server::{
        flash::{Flash, IncomingFlash},
        render,
        submission::ContactSubmission,
        ContactId, Context, ServerError,
    },
};

const LIST: &str = "/contacts";

const ADDED: &str = "Contact added successfully!";
const ADD_FAILED: &str = "Error adding contact. Please try again.";
const UPDATED: &str = "Contact updated successfully!";
const UPDATE_FAILED: &str = "Error updating contact. Please try again.";
const DELETED: &str = "Contact deleted successfully!";
const DELETE_FAILED: &str = "Error deleting contact. Please try again.";
const SAVE_FAILED: &str = "Error saving photo. Please try again.";

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage {
    flashes: Vec<Flash>,
}

pub async fn index(flash: IncomingFlash) -> Result<Response, ServerError> {
    let page = IndexPage {
        flashes: flash.messages(),
    };

    Ok(flash.finish(render(page)?))
}

#[derive(Template)]
#[template(path = "contacts.html")]
struct ContactsPage {
    flashes: Vec<Flash>,
    contacts: Vec<Contact>,
}

pub async fn list_contacts(
    flash: IncomingFlash,
    Extension(context): Extension<&'static Context>,
) -> Result<Response, ServerError> {
    let contacts = spawn_blocking(move || context.store.list()).await??;

    tracing::debug!("Listing {} contacts", contacts.len());

    let page = ContactsPage {
        flashes: flash.messages(),
        contacts,
    };

    Ok(flash.finish(render(page)?))
}

#[derive(Template)]
#[template(path = "add_contact.html")]
struct AddContactPage {
    flashes: Vec<Flash>,
    form: ContactForm,
    errors: Vec<FieldError>,
    categories: &'static [Category],
}

impl AddContactPage {
    fn new(flashes: Vec<Flash>, form: ContactForm, errors: Vec<FieldError>) -> Self {
        Self {
            flashes,
            form,
            errors,
            categories: &Category::ALL,
        }
    }
}

pub async fn add_form(flash: IncomingFlash) -> Result<Response, ServerError> {
    let page = AddContactPage::new(flash.messages(), ContactForm::default(), Vec::new());

    Ok(flash.finish(render(page)?))
}

pub async fn add_contact(
    Extension(context): Extension<&'static Context>,
    submission: ContactSubmission,
) -> Result<Response, ServerError> {
    let ContactSubmission { form, image } = submission;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(err) => {
            let page = AddContactPage::new(Vec::new(), form, err.errors().to_vec());

            return Ok(render(page)?.into_response());
        }
    };

    let res = spawn_blocking(move || -> Result<Contact, Flash> {
        let image_url = match image {
            Some(image) => context
                .uploads
                .save(&image.file_name, &image.bytes)
                .map_err(|err| {
                    tracing::error!("Failed to save photo {}: {:#}", image.file_name, err);

                    Flash::error(SAVE_FAILED)
                })?,
            None => None,
        };

        context.store.create(fields, image_url).map_err(|err| {
            tracing::error!("Failed to add contact: {:#}", err);

            Flash::error(ADD_FAILED)
        })
    })
    .await?;

    match res {
        Ok(contact) => {
            tracing::info!("Added contact {}", contact.id);

            Flash::success(ADDED).redirect(LIST)
        }
        Err(flash) => {
            let page = AddContactPage::new(vec![flash], form, Vec::new());

            Ok(render(page)?.into_response())
        }
    }
}

#[derive(Template)]
#[template(path = "update_contact.html")]
struct UpdateContactPage {
    flashes: Vec<Flash>,
    id: i64,
    image_url: Option<String>,
    form: ContactForm,
    errors: Vec<FieldError>,
    categories: &'static [Category],
}

impl UpdateContactPage {
    fn new(
        flashes: Vec<Flash>,
        contact: &Contact,
        form: ContactForm,
        errors: Vec<FieldError>,
    ) -> Self {
        Self {
            flashes,
            id: contact.id,
            image_url: contact.image_url.clone(),
            form,
            errors,
            categories: &Category::ALL,
        }
    }
}

pub async fn update_form(
    flash: IncomingFlash,
    ContactId(id): ContactId,
    Extension(context): Extension<&'static Context>,
) -> Result<Response, ServerError> {
    let contact = spawn_blocking(move || context.store.get(id)).await??;

    let form = ContactForm::from_contact(&contact);
    let page = UpdateContactPage::new(flash.messages(), &contact, form, Vec::new());

    Ok(flash.finish(render(page)?))
}

/// Never touches the stored photo, only creation attaches one.
pub async fn update_contact(
    ContactId(id): ContactId,
    Extension(context): Extension<&'static Context>,
    submission: ContactSubmission,
) -> Result<Response, ServerError> {
    let ContactSubmission { form, .. } = submission;

    let contact = spawn_blocking(move || context.store.get(id)).await??;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(err) => {
            let page = UpdateContactPage::new(Vec::new(), &contact, form, err.errors().to_vec());

            return Ok(render(page)?.into_response());
        }
    };

    match spawn_blocking(move || context.store.update(id, fields)).await? {
        Ok(contact) => {
            tracing::info!("Updated contact {}", contact.id);

            Flash::success(UPDATED).redirect(LIST)
        }
        Err(Error::NotFound { .. }) => Err(ServerError::NotFound),
        Err(err) => {
            tracing::error!("Failed to update contact {}: {:#}", id, err);

            let page =
                UpdateContactPage::new(vec![Flash::error(UPDATE_FAILED)], &contact, form, Vec::new());

            Ok(render(page)?.into_response())
        }
    }
}

pub async fn delete_contact(
    ContactId(id): ContactId,
    Extension(context): Extension<&'static Context>,
) -> Result<Response, ServerError> {
    let flash = match spawn_blocking(move || context.store.delete(id)).await? {
        Ok(()) => {
            tracing::info!("Deleted contact {}", id);

            Flash::success(DELETED)
        }
        Err(Error::NotFound { .. }) => return Err(ServerError::NotFound),
        Err(err) => {
            tracing::error!("Failed to delete contact {}: {:#}", id, err);

            Flash::error(DELETE_FAILED)
        }
    };

    flash.redirect(LIST)
}
