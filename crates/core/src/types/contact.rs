//! Contact address type.
//!
//! The storefront's contact address is a protected field: the admin agent may
//! propose a new site configuration, but the address shown to visitors always
//! comes from operator configuration. Parsing it up front keeps a typo in the
//! environment from silently reaching the public site.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ContactEmail`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactEmailError {
    /// The input is empty after trimming.
    #[error("contact email cannot be empty")]
    Empty,
    /// The input is longer than an SMTP path allows.
    #[error("contact email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace inside the address.
    #[error("contact email cannot contain whitespace")]
    Whitespace,
    /// The input does not have exactly one `@`.
    #[error("contact email must contain exactly one @ symbol")]
    AtSymbol,
    /// The mailbox (before `@`) is empty.
    #[error("contact email mailbox cannot be empty")]
    EmptyMailbox,
    /// The domain has no dot or an empty label.
    #[error("contact email domain '{0}' is not a valid host name")]
    InvalidDomain(String),
}

/// A validated contact e-mail address.
///
/// The domain is normalised to lowercase; the mailbox is kept as written.
///
/// ```
/// use prodigital_core::ContactEmail;
///
/// let email = ContactEmail::parse(" Contact@ProDigitalReviews.com ").unwrap();
/// assert_eq!(email.as_str(), "Contact@prodigitalreviews.com");
///
/// assert!(ContactEmail::parse("no-at-symbol").is_err());
/// assert!(ContactEmail::parse("a@@b.com").is_err());
/// assert!(ContactEmail::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ContactEmail(String);

impl ContactEmail {
    /// Maximum length of an address (RFC 5321 path limit).
    pub const MAX_LENGTH: usize = 254;

    /// Parse a contact address.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, contains
    /// whitespace, does not have exactly one `@`, has an empty mailbox, or has
    /// a domain without at least two non-empty dot-separated labels.
    pub fn parse(raw: &str) -> Result<Self, ContactEmailError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(ContactEmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ContactEmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(ContactEmailError::Whitespace);
        }

        let (mailbox, domain) = s.split_once('@').ok_or(ContactEmailError::AtSymbol)?;
        if domain.contains('@') {
            return Err(ContactEmailError::AtSymbol);
        }
        if mailbox.is_empty() {
            return Err(ContactEmailError::EmptyMailbox);
        }

        let domain = domain.to_ascii_lowercase();
        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
            return Err(ContactEmailError::InvalidDomain(domain));
        }

        Ok(Self(format!("{mailbox}@{domain}")))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part of the address.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl Default for ContactEmail {
    fn default() -> Self {
        Self(String::from("contact@prodigitalreviews.com"))
    }
}

impl fmt::Display for ContactEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ContactEmail {
    type Err = ContactEmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContactEmail {
    type Error = ContactEmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContactEmail> for String {
    fn from(email: ContactEmail) -> Self {
        email.0
    }
}

impl AsRef<str> for ContactEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
