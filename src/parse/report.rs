//! Colon-delimited report decoding.

use std::collections::BTreeSet;

use crate::grammar::{FieldKind, FieldSpec};

use super::ParseError;

/// Decoded value of one report field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    /// Trimmed scalar text.
    Scalar(String),
    /// Space-separated tokens; empty when the value was blank.
    List(BTreeSet<String>),
}

/// A parsed report block, keeping lines in their original order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Report {
    entries: Vec<(String, String)>,
}

impl Report {
    /// Splits `text` into trimmed `(key, value)` pairs on each line's first
    /// colon. Lines without a colon, such as section banners, are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { entries }
    }

    /// Returns the raw trimmed value of the first line whose key equals `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Returns every key in the order seen.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Decodes `field` according to its kind.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingKey`] when the key never appeared.
    pub fn field(&self, field: &FieldSpec) -> Result<FieldValue, ParseError> {
        let value = self.raw(&field.key).ok_or_else(|| ParseError::MissingKey {
            key: field.key.clone(),
        })?;
        Ok(match field.kind {
            FieldKind::Scalar => FieldValue::Scalar(value.to_owned()),
            FieldKind::List => FieldValue::List(split_list(value)),
        })
    }

    /// Decodes `field` as a list.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingKey`] when the key never appeared and
    /// [`ParseError::UnexpectedValue`] when the grammar declares the field a
    /// scalar.
    pub fn list(&self, field: &FieldSpec) -> Result<BTreeSet<String>, ParseError> {
        match self.field(field)? {
            FieldValue::List(items) => Ok(items),
            FieldValue::Scalar(value) => Err(ParseError::UnexpectedValue {
                field: format!("{} (declared scalar, read as list)", field.key),
                value,
            }),
        }
    }
}

fn split_list(value: &str) -> BTreeSet<String> {
    value
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}
