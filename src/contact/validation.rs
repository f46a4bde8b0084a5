use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::contact::{Category, Contact, ContactFields};

const REQUIRED: &str = "This field is required.";
const INVALID_CHOICE: &str = "Not a valid choice.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Every field that failed validation, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("Invalid contact: {}", join(.errors))]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    fn push(&mut self, field: &'static str, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    fn require(&mut self, field: &'static str, val: &str) {
        if is_blank(val) {
            self.push(field, REQUIRED);
        }
    }

    fn into_result<T>(self, val: T) -> Result<T, Self> {
        if self.errors.is_empty() {
            Ok(val)
        } else {
            Err(self)
        }
    }
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raw values of the HTML contact form.
///
/// Missing keys deserialize as empty strings so that a rejected form can be rendered back verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub custom_type: String,
}

impl ContactForm {
    pub fn from_contact(contact: &Contact) -> Self {
        let (kind, custom_type) = match Category::parse(&contact.kind) {
            Some(category) => (category.as_str().to_owned(), String::new()),
            None => (Category::Other.as_str().to_owned(), contact.kind.clone()),
        };

        Self {
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone().unwrap_or_default(),
            kind,
            custom_type,
        }
    }

    pub fn validate(&self) -> Result<ContactFields, ValidationError> {
        let mut errors = ValidationError::default();

        errors.require("name", &self.name);
        errors.require("phone", &self.phone);

        if is_blank(&self.kind) {
            errors.push("type", REQUIRED);
        } else if Category::parse(&self.kind).is_none() {
            errors.push("type", INVALID_CHOICE);
        }

        let fields = ContactFields {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: normalize_email(Some(&self.email)),
            kind: resolve_kind(&self.kind, Some(&self.custom_type)),
        };

        errors.into_result(fields)
    }

    pub fn is_selected(&self, category: &Category) -> bool {
        self.kind == category.as_str()
    }
}

/// JSON body accepted by the API for both creation and updates.
///
/// Unlike [`ContactForm`], any non-empty `type` is stored verbatim.
/// The optional columns distinguish an absent key (`None`) from an explicit `null` (`Some(None)`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPayload {
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub email: Option<Option<String>>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub custom_type: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub image_url: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer).map(Some)
}

impl ContactPayload {
    pub fn into_fields(self) -> Result<(ContactFields, Option<String>), ValidationError> {
        let mut errors = ValidationError::default();

        let name = self.name.unwrap_or_default();
        let phone = self.phone.unwrap_or_default();
        let kind = self.kind.unwrap_or_default();

        errors.require("name", &name);
        errors.require("phone", &phone);
        errors.require("type", &kind);

        let fields = ContactFields {
            name,
            phone,
            email: normalize_email(self.email.flatten().as_deref()),
            kind: resolve_kind(&kind, self.custom_type.as_deref()),
        };

        let image_url = self.image_url.flatten().filter(|val| !is_blank(val));

        errors.into_result((fields, image_url))
    }

    /// Overwrites only the keys present in the payload.
    pub fn apply(self, contact: &mut Contact) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();

        if let Some(name) = self.name {
            errors.require("name", &name);
            contact.name = name;
        }

        if let Some(phone) = self.phone {
            errors.require("phone", &phone);
            contact.phone = phone;
        }

        if let Some(email) = self.email {
            contact.email = normalize_email(email.as_deref());
        }

        if let Some(kind) = self.kind {
            errors.require("type", &kind);
            contact.kind = resolve_kind(&kind, self.custom_type.as_deref());
        }

        if let Some(image_url) = self.image_url {
            contact.image_url = image_url.filter(|val| !is_blank(val));
        }

        errors.into_result(())
    }
}

fn is_blank(val: &str) -> bool {
    val.trim().is_empty()
}

fn normalize_email(val: Option<&str>) -> Option<String> {
    val.filter(|val| !is_blank(val)).map(ToOwned::to_owned)
}

/// Selecting "Other" stores the free text instead, falling back to "Other" itself if that is blank.
fn resolve_kind(kind: &str, custom_type: Option<&str>) -> String {
    if kind != Category::Other.as_str() {
        return kind.to_owned();
    }

    match custom_type.map(str::trim) {
        Some(custom_type) if !custom_type.is_empty() => custom_type.to_owned(),
        _ => kind.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, phone: &str, kind: &str) -> ContactForm {
        ContactForm {
            name: name.to_owned(),
            phone: phone.to_owned(),
            kind: kind.to_owned(),
            ..Default::default()
        }
    }

    fn contact() -> Contact {
        Contact {
            id: 7,
            name: "John Doe".to_owned(),
            phone: "1234567890".to_owned(),
            email: Some("john@example.com".to_owned()),
            kind: "Personal".to_owned(),
            image_url: Some("/static/uploads/john.png".to_owned()),
        }
    }

    #[test]
    fn form_accepts_required_fields() {
        let fields = form("Jane Doe", "9876543210", "Work").validate().unwrap();

        assert_eq!(fields.name, "Jane Doe");
        assert_eq!(fields.phone, "9876543210");
        assert_eq!(fields.email, None);
        assert_eq!(fields.kind, "Work");
    }

    #[test]
    fn form_reports_every_missing_field() {
        let err = form("", "  ", "").validate().unwrap_err();

        assert!(err.has_field("name"));
        assert!(err.has_field("phone"));
        assert!(err.has_field("type"));
        assert_eq!(err.errors().len(), 3);
    }

    #[test]
    fn form_rejects_unknown_choice() {
        let err = form("Jane", "1", "Coworker").validate().unwrap_err();

        assert_eq!(
            err.errors(),
            &[FieldError {
                field: "type",
                message: INVALID_CHOICE
            }]
        );
    }

    #[test]
    fn form_does_not_check_formats() {
        let mut form = form("x", "not a number", "Friend");
        form.email = "not an email".to_owned();

        let fields = form.validate().unwrap();

        assert_eq!(fields.phone, "not a number");
        assert_eq!(fields.email.as_deref(), Some("not an email"));
    }

    #[test]
    fn other_uses_custom_type() {
        let mut form = form("Jane", "1", "Other");
        form.custom_type = "Coworker".to_owned();

        assert_eq!(form.validate().unwrap().kind, "Coworker");
    }

    #[test]
    fn other_falls_back_when_custom_type_is_blank() {
        let mut form = form("Jane", "1", "Other");
        form.custom_type = "   ".to_owned();

        assert_eq!(form.validate().unwrap().kind, "Other");
    }

    #[test]
    fn custom_type_is_ignored_for_enumerated_choices() {
        let mut form = form("Jane", "1", "Family");
        form.custom_type = "Coworker".to_owned();

        assert_eq!(form.validate().unwrap().kind, "Family");
    }

    #[test]
    fn from_contact_maps_free_text_to_other() {
        let mut contact = contact();
        contact.kind = "Coworker".to_owned();

        let form = ContactForm::from_contact(&contact);

        assert_eq!(form.kind, "Other");
        assert_eq!(form.custom_type, "Coworker");
        assert!(form.is_selected(&Category::Other));
        assert_eq!(form.validate().unwrap().kind, "Coworker");
    }

    #[test]
    fn payload_accepts_any_non_empty_type() {
        let payload = ContactPayload {
            name: Some("API User".to_owned()),
            phone: Some("5555555555".to_owned()),
            email: Some(Some("api@example.com".to_owned())),
            kind: Some("work".to_owned()),
            ..Default::default()
        };

        let (fields, image_url) = payload.into_fields().unwrap();

        assert_eq!(fields.kind, "work");
        assert_eq!(fields.email.as_deref(), Some("api@example.com"));
        assert_eq!(image_url, None);
    }

    #[test]
    fn payload_requires_phone_and_type() {
        let payload = ContactPayload {
            name: Some("Invalid User".to_owned()),
            ..Default::default()
        };

        let err = payload.into_fields().unwrap_err();

        assert!(!err.has_field("name"));
        assert!(err.has_field("phone"));
        assert!(err.has_field("type"));
    }

    #[test]
    fn apply_changes_only_present_keys() {
        let mut contact = contact();

        ContactPayload {
            phone: Some("000".to_owned()),
            ..Default::default()
        }
        .apply(&mut contact)
        .unwrap();

        assert_eq!(contact.phone, "000");
        assert_eq!(contact.name, "John Doe");
        assert_eq!(contact.email.as_deref(), Some("john@example.com"));
        assert_eq!(contact.image_url.as_deref(), Some("/static/uploads/john.png"));
    }

    #[test]
    fn apply_clears_optional_columns_given_null() {
        let mut contact = contact();

        let payload: ContactPayload =
            serde_json::from_str(r#"{ "email": null, "image_url": null }"#).unwrap();

        assert_eq!(payload.email, Some(None));
        assert_eq!(payload.name, None);

        payload.apply(&mut contact).unwrap();

        assert_eq!(contact.email, None);
        assert_eq!(contact.image_url, None);
        assert_eq!(contact.name, "John Doe");
    }

    #[test]
    fn apply_keeps_optional_columns_if_absent() {
        let mut contact = contact();

        let payload: ContactPayload = serde_json::from_str(r#"{ "name": "Jane" }"#).unwrap();

        assert_eq!(payload.email, None);

        payload.apply(&mut contact).unwrap();

        assert_eq!(contact.email.as_deref(), Some("john@example.com"));
        assert_eq!(contact.image_url.as_deref(), Some("/static/uploads/john.png"));
    }

    #[test]
    fn apply_rejects_blanking_required_fields() {
        let mut contact = contact();

        let err = ContactPayload {
            name: Some(String::new()),
            ..Default::default()
        }
        .apply(&mut contact)
        .unwrap_err();

        assert!(err.has_field("name"));
    }

    #[test]
    fn display_lists_fields() {
        let err = form("", "1", "Work").validate().unwrap_err();

        assert_eq!(err.to_string(), "Invalid contact: name: This field is required.");

        let err = form("", "", "Work").validate().unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid contact: name: This field is required., phone: This field is required."
        );
    }
}
