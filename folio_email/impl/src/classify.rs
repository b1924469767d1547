use std::{error::Error, io};

use folio_email_contracts::EmailFailureKind;
use lettre::transport::smtp;

/// Smtp reply codes that indicate rejected credentials.
const AUTHENTICATION_CODES: &[&str] = &["530", "534", "535"];

pub(crate) fn classify(err: &smtp::Error) -> EmailFailureKind {
    if err.is_timeout() {
        return EmailFailureKind::Timeout;
    }

    if let Some(code) = err.status() {
        let code = code.to_string();
        return if AUTHENTICATION_CODES.contains(&code.as_str()) {
            EmailFailureKind::Authentication
        } else {
            EmailFailureKind::Unknown
        };
    }

    if err.is_tls() {
        return EmailFailureKind::Connection;
    }

    io_error_kind(err).map_or(EmailFailureKind::Unknown, classify_io)
}

fn classify_io(kind: io::ErrorKind) -> EmailFailureKind {
    use io::ErrorKind::*;

    match kind {
        TimedOut | WouldBlock => EmailFailureKind::Timeout,
        ConnectionRefused | NotFound | AddrNotAvailable | AddrInUse | PermissionDenied => {
            EmailFailureKind::Connection
        }
        _ => EmailFailureKind::Socket,
    }
}

fn io_error_kind(err: &(dyn Error + 'static)) -> Option<io::ErrorKind> {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(err) = err.downcast_ref::<io::Error>() {
            return Some(err.kind());
        }
        current = err.source();
    }
    None
}
