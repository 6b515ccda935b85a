//! # Validation Module
//!
//! Input rules for books entering the catalog.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Input wizard (collaborator)                                  │
//! │  └── Collects name → author → genre → optional photo                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Dispatcher (shelf-db)                                        │
//! │  └── THIS MODULE: trims and checks every field                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── Foreign key to users                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::types::NewBook;
//! use shelf_core::validation::validate_new_book;
//!
//! let book = validate_new_book(NewBook::new("  Dune ", "Herbert", "SciFi")).unwrap();
//! assert_eq!(book.name, "Dune");
//!
//! assert!(validate_new_book(NewBook::new("", "Herbert", "SciFi")).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::NewBook;
use crate::{MAX_FIELD_CHARS, MAX_PHOTO_REFERENCE_CHARS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates one required text field and returns it trimmed.
///
/// ## Rules
/// - Must not be blank after trimming
/// - At most [`MAX_FIELD_CHARS`] characters
/// - No control characters (newlines included)
pub fn validate_text_field(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_FIELD_CHARS,
        });
    }

    if value.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(value.to_string())
}

/// Validates an optional photo reference. Blank counts as absent.
pub fn validate_photo_reference(value: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.chars().count() > MAX_PHOTO_REFERENCE_CHARS {
        return Err(ValidationError::TooLong {
            field: "photo_reference".to_string(),
            max: MAX_PHOTO_REFERENCE_CHARS,
        });
    }

    Ok(Some(value.to_string()))
}

/// Validates a whole [`NewBook`], returning the normalized input.
pub fn validate_new_book(book: NewBook) -> ValidationResult<NewBook> {
    Ok(NewBook {
        name: validate_text_field("name", &book.name)?,
        author: validate_text_field("author", &book.author)?,
        genre: validate_text_field("genre", &book.genre)?,
        photo_reference: validate_photo_reference(book.photo_reference.as_deref())?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_fields() {
        let book = validate_new_book(NewBook::new(" Dune\t", " Herbert ", "SciFi ")).unwrap();
        assert_eq!(book, NewBook::new("Dune", "Herbert", "SciFi"));
    }

    #[test]
    fn test_blank_fields_are_required() {
        let err = validate_new_book(NewBook::new("Dune", "   ", "SciFi")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Required {
                field: "author".to_string()
            }
        );
    }

    #[test]
    fn test_length_is_counted_in_chars() {
        // 256 Cyrillic letters are 512 bytes but still fit.
        let name = "я".repeat(MAX_FIELD_CHARS);
        assert!(validate_text_field("name", &name).is_ok());

        let name = "я".repeat(MAX_FIELD_CHARS + 1);
        assert!(matches!(
            validate_text_field("name", &name),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_rejects_control_characters() {
        assert!(matches!(
            validate_text_field("genre", "Sci\nFi"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_blank_photo_is_absent() {
        let book = validate_new_book(NewBook::new("Dune", "Herbert", "SciFi").with_photo("  "))
            .unwrap();
        assert_eq!(book.photo_reference, None);

        let book = validate_new_book(NewBook::new("Dune", "Herbert", "SciFi").with_photo("AgAD"))
            .unwrap();
        assert_eq!(book.photo_reference.as_deref(), Some("AgAD"));
    }
}
