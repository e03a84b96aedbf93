//! Contact identifiers used for one-time-password sign-in.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing contact details.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The input string is empty.
    #[error("value cannot be empty")]
    Empty,
    /// The email is longer than RFC 5321 allows.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The email is not `local@domain`.
    #[error("email must look like name@domain")]
    MalformedEmail,
    /// The phone number has the wrong number of digits.
    #[error("phone number must have {min}-{max} digits")]
    PhoneDigits {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
    /// The phone number contains characters other than digits and separators.
    #[error("phone number contains invalid characters")]
    PhoneCharacters,
    /// The one-time code is not 4-8 digits.
    #[error("code must be 4-8 digits")]
    MalformedCode,
}

/// An email address.
///
/// ## Constraints
///
/// - Length: 1-254 characters
/// - Exactly one `@` with non-empty parts on both sides
/// - The domain contains a dot that is neither first nor last
///
/// ```
/// use lumen_core::Email;
///
/// assert!(Email::parse("ada@example.com").is_ok());
/// assert!(Email::parse("ada@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an email, normalizing surrounding whitespace and case.
    ///
    /// # Errors
    ///
    /// Returns `ContactError` when the input is empty, too long, or malformed.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ContactError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = s.split_once('@').ok_or(ContactError::MalformedEmail)?;
        let domain_ok = domain
            .find('.')
            .is_some_and(|dot| dot > 0 && !domain.ends_with('.'));
        if local.is_empty() || domain.contains('@') || !domain_ok {
            return Err(ContactError::MalformedEmail);
        }

        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A phone number reduced to `+` and digits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    const MIN_DIGITS: usize = 7;
    const MAX_DIGITS: usize = 15;

    /// Parse a phone number, dropping spaces, dashes, dots and parentheses.
    ///
    /// # Errors
    ///
    /// Returns `ContactError` when the input has other characters or the
    /// digit count is outside 7-15 (E.164).
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Empty);
        }

        let (plus, rest) = s.strip_prefix('+').map_or(("", s), |rest| ("+", rest));
        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(ContactError::PhoneCharacters),
            }
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(ContactError::PhoneDigits {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(format!("{plus}{digits}")))
    }

    /// Returns the normalized number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is signing in: an email or a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginIdentifier {
    Email(Email),
    Phone(Phone),
}

impl LoginIdentifier {
    /// Classify free text: anything with an `@` must be an email.
    ///
    /// # Errors
    ///
    /// Returns the parse error of the chosen kind.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        if s.contains('@') {
            Email::parse(s).map(Self::Email)
        } else {
            Phone::parse(s).map(Self::Phone)
        }
    }
}

/// A one-time sign-in code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Parse a 4-8 digit code.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::MalformedCode` otherwise.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if (4..=8).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_owned()))
        } else {
            Err(ContactError::MalformedCode)
        }
    }

    /// The code digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode([REDACTED])")
    }
}
