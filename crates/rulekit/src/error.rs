//! Conversion errors.
//!
//! Every variant is terminal: retrying the same input cannot succeed, and a
//! statement that fails conversion must never be sent to the service.

use thiserror::Error;

/// Result type alias for statement conversion.
pub type Result<T> = std::result::Result<T, ConversionError>;

/// Why a statement could not be converted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// A byte match set both the text and the base64 search string.
    #[error("ByteMatchStatement must set exactly one of SearchString or SearchStringBase64, not both")]
    ConflictingSearchString,

    /// A byte match set neither search string.
    #[error("ByteMatchStatement must set one of SearchString or SearchStringBase64")]
    MissingSearchString,

    /// The base64 search string did not decode.
    #[error("SearchStringBase64 is not valid base64: {0}")]
    InvalidBase64(String),

    /// A size constraint was not an integral number in range.
    #[error("SizeConstraintStatement Size must be a whole number, got {0}")]
    FractionalSize(f64),

    /// A JSON match pattern set both `All` and `IncludedPaths`.
    #[error("JsonMatchPattern must set either All or IncludedPaths, not both")]
    ConflictingMatchPattern,

    /// The statement tree nests deeper than the converter accepts.
    #[error("statement nesting exceeds {limit} levels")]
    TooDeep {
        /// Maximum accepted depth.
        limit: usize,
    },

    /// A wire statement node had zero or several members populated.
    #[error("statement node has {populated} members set, expected exactly one")]
    MalformedStatement {
        /// Number of populated members found.
        populated: usize,
    },

    /// A wire field selector had zero or several members populated.
    #[error("FieldToMatch has {populated} members set, expected exactly one")]
    MalformedFieldToMatch {
        /// Number of populated members found.
        populated: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_field() {
        assert!(
            ConversionError::ConflictingSearchString
                .to_string()
                .contains("SearchStringBase64")
        );
        assert_eq!(
            ConversionError::TooDeep { limit: 32 }.to_string(),
            "statement nesting exceeds 32 levels"
        );
        assert!(
            ConversionError::FractionalSize(1.5)
                .to_string()
                .contains("1.5")
        );
    }
}
