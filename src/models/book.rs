//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::enums::BookStatus;

/// Catalog entry.
///
/// `sequence_number` orders the catalog tree; `id` is the point-lookup key.
/// Legacy exports from the browser catalog used Spanish field names, which
/// are accepted as aliases on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: String,
    #[serde(alias = "numero")]
    pub sequence_number: u64,
    #[serde(alias = "titulo")]
    pub title: String,
    #[serde(alias = "autor")]
    pub author: String,
    #[serde(default, alias = "editorial")]
    pub publisher: String,
    #[serde(default, alias = "categoria")]
    pub category: String,
    #[serde(default, alias = "anio", deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(default, alias = "estado")]
    pub status: BookStatus,
    #[serde(default, alias = "fechaRegistro")]
    pub registered_date: String,
}

impl Book {
    /// Case-insensitive match on title, author or sequence number.
    /// `needle` must already be lowercased and trimmed.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.author.to_lowercase().contains(needle)
            || self.sequence_number.to_string().contains(needle)
    }

    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Available
    }

    /// Overwrite the editable fields, leaving id, sequence number and status alone
    pub fn apply(&mut self, fields: BookFields) {
        let fields = fields.trimmed();
        self.title = fields.title;
        self.author = fields.author;
        self.publisher = fields.publisher;
        self.category = fields.category;
        self.year = fields.year;
    }
}

/// Editable fields of a book, used for registration and edits
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct BookFields {
    #[validate(custom(function = "not_blank", message = "Title is required"))]
    pub title: String,
    #[validate(custom(function = "not_blank", message = "Author is required"))]
    pub author: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: String,
}

impl BookFields {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            publisher: self.publisher.trim().to_string(),
            category: self.category.trim().to_string(),
            year: self.year.trim().to_string(),
        }
    }
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Years were sometimes exported as numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null(()) => String::new(),
    })
}
