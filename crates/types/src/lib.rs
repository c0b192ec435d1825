//! Validated primitives shared across the WardOps crates.
//!
//! Signer names, reviewer names and patient identifiers all arrive as free text from the REST API,
//! the CLI or a fixture file. The domain core only accepts them as [`NonEmptyText`].

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// Nothing left after trimming whitespace
    #[error("a name or identifier must not be blank")]
    Blank,
}

/// Free text with surrounding whitespace removed and at least one character left.
///
/// Deserializing goes through the same check, so a blank signer in a fixture file fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// # Errors
    ///
    /// Returns [`TextError::Blank`] when `input` is empty or whitespace only.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        match input.as_ref().trim() {
            "" => Err(TextError::Blank),
            text => Ok(Self(text.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyText> for String {
    fn from(text: NonEmptyText) -> Self {
        text.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let text = NonEmptyText::new("  Dr. Patel \n").expect("non-empty");
        assert_eq!(text.as_str(), "Dr. Patel");
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(NonEmptyText::new(""), Err(TextError::Blank));
        assert_eq!(NonEmptyText::new("   \t"), Err(TextError::Blank));
    }

    #[test]
    fn deserialize_rejects_blank_strings() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"").expect_err("blank");
        assert!(err.to_string().contains("must not be blank"));

        let ok: NonEmptyText = serde_json::from_str("\" John Smith\"").expect("valid");
        assert_eq!(ok.to_string(), "John Smith");
        assert_eq!(serde_json::to_string(&ok).expect("serialize"), "\"John Smith\"");
    }
}
