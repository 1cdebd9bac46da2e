//! Contact phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input contains no digits at all.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains something other than digits and separators.
    #[error("phone number contains an invalid character: {0:?}")]
    InvalidCharacter(char),
    /// Too few or too many digits.
    #[error("phone number must have between {min} and {max} digits (got {got})")]
    BadLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
        /// Digits found.
        got: usize,
    },
}

/// A phone number reduced to its digits, international prefix included.
///
/// This is the form `wa.me` deep links expect: no `+`, no spaces, no dashes.
///
/// ## Constraints
///
/// - Separators (space, `-`, `.`, `/`, parentheses) and a leading `+` are
///   stripped
/// - Any other non-digit character is rejected
/// - 6-15 digits (E.164 allows at most 15)
///
/// ## Examples
///
/// ```
/// use acchiappasogni_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+39 340 123 4567").unwrap();
/// assert_eq!(phone.digits(), "393401234567");
///
/// assert!(PhoneNumber::parse("").is_err());
/// assert!(PhoneNumber::parse("call me").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum digit count.
    pub const MIN_DIGITS: usize = 6;
    /// Maximum digit count (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a phone number, keeping only its digits.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains letters or other
    /// unexpected characters, or has a digit count outside 6-15.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('+').unwrap_or(trimmed);

        let mut digits = String::with_capacity(body.len());
        for ch in body.chars() {
            match ch {
                '0'..='9' => digits.push(ch),
                ' ' | '-' | '.' | '/' | '(' | ')' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(PhoneError::BadLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
                got: digits.len(),
            });
        }

        Ok(Self(digits))
    }

    /// Returns the digits.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}
