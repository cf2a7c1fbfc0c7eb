//! Scrapers for the `pac copilot create` text output.
//!
//! The CLI prints human-oriented text with no versioned format, so the
//! identifiers of the new copilot can only be pattern-matched out of it. All
//! of that coupling is isolated here; a missing match falls back to a
//! sentinel instead of failing the request.

use regex::Regex;

/// Fallback when no copilot id is present in the output.
pub const ID_NOT_FOUND: &str = "ID not found";

/// Fallback when no copilot URL is present in the output.
pub const URL_NOT_FOUND: &str = "URL not found";

/// First `id <hex-with-dashes>` token in the command output.
#[must_use]
pub fn copilot_id(output: &str) -> String {
    capture(r"id ([0-9a-fA-F-]+)", output).unwrap_or_else(|| ID_NOT_FOUND.to_string())
}

/// First copilot URL under the fixed portal base path.
#[must_use]
pub fn copilot_url(output: &str) -> String {
    capture(
        r"(https://web\.powerva\.microsoft\.com/environments/[^\s]+)",
        output,
    )
    .unwrap_or_else(|| URL_NOT_FOUND.to_string())
}

fn capture(pattern: &str, output: &str) -> Option<String> {
    Regex::new(pattern)
        .ok()?
        .captures(output)?
        .get(1)
        .map(|m| m.as_str().to_string())
}
