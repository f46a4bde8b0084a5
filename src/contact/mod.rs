mod category;
mod validation;

use serde::{Deserialize, Serialize};

pub use category::Category;
pub use validation::{ContactForm, ContactPayload, FieldError, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub image_url: Option<String>,
}

/// Validated values for the user-editable columns of a [`Contact`].
///
/// Holds no image: only creation attaches one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFields {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub kind: String,
}

impl Contact {
    pub fn apply(&mut self, fields: ContactFields) {
        self.name = fields.name;
        self.phone = fields.phone;
        self.email = fields.email;
        self.kind = fields.kind;
    }
}
