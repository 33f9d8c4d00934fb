use thiserror::Error;

/// What went wrong while reading a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorCause {
    /// `"` without a matching closing quote
    UnclosedQuote,
    /// `is:` value outside the known vocabulary
    UnknownState,
    /// `flag:` value that is not a number between 0 and 7
    InvalidFlag,
    /// Unknown property, missing operator or non-numeric value in `prop:`
    InvalidProperty,
    /// Bad day count or rating in `added:` / `rated:`
    InvalidDate,
    /// `(` without `)` or the other way round
    UnbalancedParenthesis,
    /// Query ended where a term was expected
    UnexpectedEnd,
    /// Operator found where a term was expected
    UnexpectedToken,
}

/// The single error kind of the search language.
///
/// Carries a message fit for end users, the offending part of the query and
/// its character offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at position {position}: `{fragment}`)")]
pub struct SearchSyntaxError {
    pub cause: SyntaxErrorCause,
    pub message: String,
    pub fragment: String,
    pub position: usize,
}

impl SearchSyntaxError {
    pub fn new(
        cause: SyntaxErrorCause,
        message: impl Into<String>,
        fragment: impl Into<String>,
        position: usize,
    ) -> Self {
        SearchSyntaxError {
            cause,
            message: message.into(),
            fragment: fragment.into(),
            position,
        }
    }
}

#[test]
fn test_display_includes_position_and_fragment() {
    let err = SearchSyntaxError::new(
        SyntaxErrorCause::InvalidFlag,
        "Invalid flag '9': flags range from 0 to 7",
        "flag:9",
        4,
    );
    assert_eq!(
        err.to_string(),
        "Invalid flag '9': flags range from 0 to 7 (at position 4: `flag:9`)"
    );
}
