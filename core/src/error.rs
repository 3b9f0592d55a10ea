//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the compiler.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors (unreadable or missing includes).
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Malformed YAML text.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// Failure while serializing the route tree.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Invalid compile input (e.g. the document root is not a mapping).
    #[from(ignore)]
    #[display("Configuration Error: {_0}")]
    Configuration(String),

    /// A trait declares a placeholder whose variable the using mapping never supplies.
    #[from(ignore)]
    #[display("Unfulfilled variable '{variable}' required by trait '{trait_name}'")]
    UnfulfilledVariable {
        /// Name of the trait being applied.
        trait_name: String,
        /// Name of the missing `.vars` entry.
        variable: String,
    },

    /// A placeholder path walks into something other than a mapping or string.
    #[from(ignore)]
    #[display("Placeholder Path Error: {_0}")]
    PlaceholderPath(String),

    /// `!use` names a trait that was never registered with `!define`.
    #[from(ignore)]
    #[display("Trait not found: {_0}")]
    TraitNotFound(String),

    /// A YAML tag with no registered handler.
    #[from(ignore)]
    #[display("Unknown tag: {_0}")]
    UnknownTag(String),

    /// A known tag applied to the wrong kind of node or missing required keys.
    #[from(ignore)]
    #[display("Invalid Tag Usage: {_0}")]
    InvalidTag(String),

    /// A field value has the wrong YAML shape for the route model.
    #[from(ignore)]
    #[display("Shape Error: {_0}")]
    Shape(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::NotFound, "missing.yaml");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(ref e) if e.kind() == ErrorKind::NotFound));
    }

    #[test]
    fn test_string_conversion() {
        // String defaults to General, never to one of the tagged variants
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_yaml_conversion() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [1, 2").unwrap_err();
        let app_err: AppError = yaml_err.into();
        assert!(matches!(app_err, AppError::Yaml(_)));
        assert!(app_err.to_string().starts_with("YAML Error:"));
    }

    #[test]
    fn test_unfulfilled_variable_display() {
        let app_err = AppError::UnfulfilledVariable {
            trait_name: "auth".into(),
            variable: "token".into(),
        };
        assert_eq!(
            app_err.to_string(),
            "Unfulfilled variable 'token' required by trait 'auth'"
        );
    }
}
