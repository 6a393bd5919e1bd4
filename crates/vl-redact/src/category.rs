//! PII categories.

use crate::error::RedactError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A sensitive-data category such as `NAME` or `SSN`.
///
/// Always an uppercase identifier (`[A-Z][A-Z0-9_]*`) so it can be embedded in
/// placeholder tokens unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(Cow<'static, str>);

impl Category {
    pub const NAME: Category = Category(Cow::Borrowed("NAME"));
    pub const EMAIL: Category = Category(Cow::Borrowed("EMAIL"));
    pub const PHONE: Category = Category(Cow::Borrowed("PHONE"));
    pub const SSN: Category = Category(Cow::Borrowed("SSN"));
    pub const ADDRESS: Category = Category(Cow::Borrowed("ADDRESS"));
    pub const DATE_OF_BIRTH: Category = Category(Cow::Borrowed("DATE_OF_BIRTH"));
    pub const CREDIT_CARD: Category = Category(Cow::Borrowed("CREDIT_CARD"));
    pub const IP_ADDRESS: Category = Category(Cow::Borrowed("IP_ADDRESS"));
    pub const MEDICAL_RECORD: Category = Category(Cow::Borrowed("MEDICAL_RECORD"));
    pub const NATIONAL_ID: Category = Category(Cow::Borrowed("NATIONAL_ID"));
    pub const PASSPORT: Category = Category(Cow::Borrowed("PASSPORT"));
    pub const BANK_ACCOUNT: Category = Category(Cow::Borrowed("BANK_ACCOUNT"));
    pub const ORGANIZATION: Category = Category(Cow::Borrowed("ORGANIZATION"));
    pub const LOCATION: Category = Category(Cow::Borrowed("LOCATION"));
    pub const SECRET: Category = Category(Cow::Borrowed("SECRET"));

    /// Parse a category, upper-casing ASCII letters and mapping `-` and
    /// spaces to `_`.
    pub fn new(name: &str) -> Result<Self, RedactError> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();

        if is_identifier(&normalized) {
            Ok(Category(Cow::Owned(normalized)))
        } else {
            Err(RedactError::InvalidCategory(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Categories that directly identify a person or account. Leaks of these
    /// are reported as critical.
    pub fn is_direct_identifier(&self) -> bool {
        matches!(
            self.as_str(),
            "SSN"
                | "CREDIT_CARD"
                | "NATIONAL_ID"
                | "PASSPORT"
                | "BANK_ACCOUNT"
                | "MEDICAL_RECORD"
                | "SECRET"
        )
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

impl TryFrom<String> for Category {
    type Error = RedactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Category::new(&value)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0.into_owned()
    }
}

impl std::str::FromStr for Category {
    type Err = RedactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::new(s)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
