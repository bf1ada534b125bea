//! Session identifier to storage key mapping.
//!
//! Session identifiers are chosen by callers and may contain anything
//! (paths, URLs, whitespace). Storage keys are used directly as file names,
//! so they are restricted to `[A-Za-z0-9_-]`.
//!
//! Two identifiers that sanitize to the same key share one physical entry.
//! This is a known limitation: `"a/b"` and `"a:b"` both resolve to `"a-b"`.

/// Key used when sanitization leaves nothing behind.
pub const FALLBACK_KEY: &str = "session";

/// Longest key produced, in bytes.
pub const MAX_KEY_LEN: usize = 128;

const SEPARATOR: char = '-';

/// Resolve a session identifier to a filesystem-safe storage key.
///
/// Every character outside `[A-Za-z0-9_-]` becomes `-`, runs of `-` collapse
/// to one, and leading/trailing `-` are stripped. The result is pure and
/// deterministic, and `resolve_key(&resolve_key(x)) == resolve_key(x)`.
pub fn resolve_key(session_id: &str) -> String {
    let mut key = String::with_capacity(session_id.len().min(MAX_KEY_LEN));

    for ch in session_id.chars() {
        let ch = if ch.is_ascii_alphanumeric() || ch == '_' {
            ch
        } else {
            SEPARATOR
        };

        if ch == SEPARATOR && (key.is_empty() || key.ends_with(SEPARATOR)) {
            continue;
        }

        key.push(ch);
        if key.len() >= MAX_KEY_LEN {
            break;
        }
    }

    let trimmed = key.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        FALLBACK_KEY.to_string()
    } else {
        trimmed.to_string()
    }
}
