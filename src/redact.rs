//! Secret redaction for error text and logs
//!
//! OCAPI fault bodies can echo the bearer token back (`accessToken`
//! arguments on `InvalidAccessTokenException`), and token endpoint errors
//! sometimes include the token that was issued. Everything that ends up in
//! an `Error` or a log line passes through here first.

use regex::Regex;
use std::sync::LazyLock;

/// Replacement for masked values
pub const MASK: &str = "****";

/// Longest body excerpt carried in an error
pub const EXCERPT_LIMIT: usize = 500;

/// JSON string fields that carry tokens
static TOKEN_FIELD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(accessToken|access_token|refresh_token|client_secret)"\s*:\s*"[^"]*""#)
        .expect("token field regex is valid")
});

/// `Bearer <token>` fragments
static BEARER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9\-._~+/]+=*").expect("bearer regex is valid")
});

/// Mask token-bearing fields, bearer fragments, and any known secret
pub fn redact(text: &str, secrets: &[&str]) -> String {
    let mut out = TOKEN_FIELD_REGEX
        .replace_all(text, |caps: &regex::Captures<'_>| {
            format!("\"{}\": \"{MASK}\"", &caps[1])
        })
        .into_owned();

    out = BEARER_REGEX
        .replace_all(&out, format!("Bearer {MASK}").as_str())
        .into_owned();

    for secret in secrets {
        if !secret.is_empty() {
            out = out.replace(secret, MASK);
        }
    }

    out
}

/// Redact then cut to at most `EXCERPT_LIMIT` characters
pub fn excerpt(text: &str, secrets: &[&str]) -> String {
    let redacted = redact(text, secrets);
    truncate(&redacted, EXCERPT_LIMIT)
}

/// Truncate on a char boundary, marking the cut
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}... [truncated]", &text[..idx]),
        None => text.to_string(),
    }
}
