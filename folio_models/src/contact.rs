use std::sync::LazyLock;

use nutype::nutype;
use regex::Regex;
use thiserror::Error;

use crate::email_address::EmailAddress;

/// Minimal `local@domain.tld` shape: an `@`, at least one `.` after it and no
/// whitespace anywhere.
pub static CONTACT_EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// A contact form submission exactly as it was received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub message: Option<String>,
}

/// A validated contact form submission, ready to be relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub author: ContactMessageAuthor,
    pub company: Option<ContactCompany>,
    pub content: ContactMessageContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessageAuthor {
    pub name: ContactMessageAuthorName,
    pub email: EmailAddress,
}

#[nutype(
    sanitize(trim),
    validate(len_char_max = 256),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Display)
)]
pub struct ContactMessageAuthorName(String);

#[nutype(
    sanitize(trim),
    validate(len_char_max = 256),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Display)
)]
pub struct ContactCompany(String);

#[nutype(
    validate(len_char_max = 4096),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Display)
)]
pub struct ContactMessageContent(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContactValidationError {
    #[error("Name, email and message are required.")]
    MissingFields,
    #[error("The email address is malformed.")]
    InvalidEmail,
    #[error("A field exceeds its maximum length.")]
    TooLong,
}

impl ContactSubmission {
    /// Validates the submission.
    ///
    /// Blank fields count as missing. The email address has to match
    /// [`CONTACT_EMAIL_REGEX`] and be usable as a mailbox address. An empty
    /// company is treated as if it was not provided.
    pub fn validate(self) -> Result<ContactMessage, ContactValidationError> {
        let (Some(name), Some(email), Some(content)) = (
            self.name.filter(|x| !is_blank(x)),
            self.email.filter(|x| !is_blank(x)),
            self.message.filter(|x| !is_blank(x)),
        ) else {
            return Err(ContactValidationError::MissingFields);
        };

        if !CONTACT_EMAIL_REGEX.is_match(&email) {
            return Err(ContactValidationError::InvalidEmail);
        }
        let email = email
            .parse::<EmailAddress>()
            .map_err(|_| ContactValidationError::InvalidEmail)?;

        let name =
            ContactMessageAuthorName::try_new(name).map_err(|_| ContactValidationError::TooLong)?;
        let company = self
            .company
            .filter(|x| !is_blank(x))
            .map(ContactCompany::try_new)
            .transpose()
            .map_err(|_| ContactValidationError::TooLong)?;
        let content =
            ContactMessageContent::try_new(content).map_err(|_| ContactValidationError::TooLong)?;

        Ok(ContactMessage {
            author: ContactMessageAuthor { name, email },
            company,
            content,
        })
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
