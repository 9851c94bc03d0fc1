//! Envelope extraction.
//!
//! Turns raw RFC 5322 message bytes into the `Message` records the threader
//! consumes. Only the headers that matter for threading are read, using the
//! `mailparse` crate.
//!
//! # Threading Headers
//!
//! - **Message-ID**: Unique identifier (required)
//! - **Subject**: Used for the subject grouping fallback
//! - **References**: Full reference chain from oldest to newest
//! - **In-Reply-To**: Direct parent, used only when References is missing
//!
//! Ids are stored without angle brackets, so `<a@b>` in one header and `a@b`
//! in another refer to the same message.

use mailparse::{MailHeaderMap, parse_headers};
use thiserror::Error;

use crate::config::ThreadingConfig;
use crate::threading::Message;

/// Errors that can be returned while extracting an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("failed to parse headers: {0}")]
    MimeParse(#[from] mailparse::MailParseError),
    #[error("missing Message-ID header")]
    MissingMessageId,
}

/// Remove NUL bytes and surrounding whitespace
fn sanitize_text(text: &str) -> String {
    text.replace('\0', "").trim().to_string()
}

/// Clean and normalize message IDs by removing angle brackets and whitespace
fn normalize_message_id(msg_id: Option<String>) -> Option<String> {
    msg_id.and_then(|id| {
        let cleaned = id.trim().trim_matches(&['<', '>'][..]).trim();
        if cleaned.is_empty() {
            None
        } else {
            Some(sanitize_text(cleaned))
        }
    })
}

/// Extract message IDs from a References header
/// Uses whitespace-based splitting for better compatibility
fn extract_references(header_value: &str) -> Vec<String> {
    header_value
        .split_whitespace()
        .map(|id| {
            // Remove angle brackets and sanitize
            let cleaned = id.trim().trim_matches(&['<', '>'][..]);
            sanitize_text(cleaned)
        })
        .filter(|id| !id.is_empty())
        .collect()
}

/// Parse the threading envelope of a raw email.
///
/// Only the header block is examined; the body may be missing or malformed.
///
/// # Fields
///
/// - **Message-ID**: Required, angle brackets stripped
/// - **Subject**: Empty string if missing, so it never matches other subjects
/// - **References**: Empty if missing; falls back to In-Reply-To when
///   `config.in_reply_to_fallback` is set
pub fn parse_envelope(raw: &[u8], config: &ThreadingConfig) -> Result<Message, EnvelopeError> {
    let (headers, _body_offset) = parse_headers(raw).map_err(|e| {
        log::debug!("failed to parse headers: {}", e);
        EnvelopeError::MimeParse(e)
    })?;

    let id = normalize_message_id(headers.get_first_value("Message-ID")).ok_or_else(|| {
        log::debug!("missing Message-ID header");
        EnvelopeError::MissingMessageId
    })?;

    let subject = headers
        .get_first_value("Subject")
        .map(|s| sanitize_text(&s))
        .unwrap_or_default();

    let mut references = headers
        .get_first_value("References")
        .map(|v| extract_references(&v))
        .unwrap_or_default();

    if references.is_empty() && config.in_reply_to_fallback {
        if let Some(in_reply_to) = normalize_message_id(headers.get_first_value("In-Reply-To")) {
            references.push(in_reply_to);
        }
    }

    log::trace!("parsed envelope: {} - {}", id, subject);

    Ok(Message {
        id,
        subject,
        references,
    })
}
