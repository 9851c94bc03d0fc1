//! Mailbox loading
//!
//! A mailbox is the unit the threader works on: one flat list of messages.
//! It is read either from a JSON file holding an array of messages, or from a
//! directory holding one raw RFC 5322 message per file.

use std::fs;
use std::path::Path;

use crate::config::ThreadingConfig;
use crate::envelope::parse_envelope;
use crate::error::ThreadingError;
use crate::threading::Message;

/// Load the messages of one mailbox.
///
/// Directory entries are read in file-name order. Files that cannot be parsed
/// as messages are skipped with a warning; the rest of the mailbox still
/// loads. A JSON file, on the other hand, must be valid as a whole.
///
/// If `config.max_messages` is set (and not 0), only the last `max_messages`
/// messages are kept.
pub fn load_mailbox(path: &Path, config: &ThreadingConfig) -> Result<Vec<Message>, ThreadingError> {
    let metadata = fs::metadata(path).map_err(|e| ThreadingError::io(path, e))?;

    let messages = if metadata.is_dir() {
        load_message_directory(path, config)?
    } else {
        load_message_list(path)?
    };

    Ok(apply_message_limit(messages, config.max_messages, path))
}

/// Read a JSON array of messages
fn load_message_list(path: &Path) -> Result<Vec<Message>, ThreadingError> {
    let contents = fs::read(path).map_err(|e| ThreadingError::io(path, e))?;
    serde_json::from_slice(&contents).map_err(|e| ThreadingError::json(path, e))
}

/// Read every regular file in a directory as one raw message
fn load_message_directory(
    path: &Path,
    config: &ThreadingConfig,
) -> Result<Vec<Message>, ThreadingError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| ThreadingError::io(path, e))? {
        let entry = entry.map_err(|e| ThreadingError::io(path, e))?;
        let file_type = entry.file_type().map_err(|e| ThreadingError::io(entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut messages = Vec::with_capacity(files.len());
    for file in files {
        let raw = fs::read(&file).map_err(|e| ThreadingError::io(&file, e))?;
        match parse_envelope(&raw, config) {
            Ok(message) => messages.push(message),
            Err(source) => {
                let err = ThreadingError::envelope(&file, source);
                log::warn!("skipping message: {}", err);
            }
        }
    }

    log::debug!(
        "loaded {} messages from directory {}",
        messages.len(),
        path.display()
    );

    Ok(messages)
}

/// Keep the trailing `limit` messages (the most recent window). A limit of 0
/// means unlimited.
fn apply_message_limit(mut messages: Vec<Message>, limit: Option<usize>, path: &Path) -> Vec<Message> {
    if let Some(limit) = limit.filter(|&limit| limit > 0) {
        if messages.len() > limit {
            log::warn!(
                "mailbox {} has {} messages, keeping the last {}",
                path.display(),
                messages.len(),
                limit
            );
            messages = messages.split_off(messages.len() - limit);
        }
    }

    messages
}
