use std::env;

fn parse_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

fn parse_usize(value: Option<String>) -> Option<usize> {
    value.and_then(|value| value.trim().parse::<usize>().ok())
}

/// Runtime configuration for threading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadingConfig {
    /// Merge header-less replies into threads by subject
    pub group_by_subject: bool,
    /// Keep at most this many (most recent) messages per mailbox
    pub max_messages: Option<usize>,
    /// Use In-Reply-To when a message has no References header
    pub in_reply_to_fallback: bool,
}

impl ThreadingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    ///
    /// Reads `THREADING_GROUP_BY_SUBJECT`, `THREADING_MAX_MESSAGES` and
    /// `THREADING_IN_REPLY_TO_FALLBACK`. Missing or unparsable values fall back
    /// to `defaults()`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::defaults();
        Self {
            group_by_subject: parse_bool(lookup("THREADING_GROUP_BY_SUBJECT"), defaults.group_by_subject),
            max_messages: parse_usize(lookup("THREADING_MAX_MESSAGES")).and_then(Self::message_limit),
            in_reply_to_fallback: parse_bool(
                lookup("THREADING_IN_REPLY_TO_FALLBACK"),
                defaults.in_reply_to_fallback,
            ),
        }
    }

    /// Settings used when nothing is configured
    pub fn defaults() -> Self {
        Self {
            group_by_subject: true,
            max_messages: None,
            in_reply_to_fallback: true,
        }
    }

    /// Set the per-mailbox message cap; 0 means unlimited
    pub fn with_max_messages(mut self, limit: usize) -> Self {
        self.max_messages = Self::message_limit(limit);
        self
    }

    fn message_limit(limit: usize) -> Option<usize> {
        (limit > 0).then_some(limit)
    }
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
