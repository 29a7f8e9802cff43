//! Phone number canonicalization.
//!
//! Both stored recipients and unsubscribe entries go through
//! [`normalize_phone`] so that set membership is an exact string compare.

/// Canonicalize a free-form phone string.
///
/// Whitespace and punctuation are dropped, ASCII digits are kept, and a `+`
/// survives only as the very first character. Input without a single digit
/// normalizes to the empty string, which callers treat as invalid.
pub fn normalize_phone(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars().filter(|c| !c.is_whitespace()) {
        if c.is_ascii_digit() || (c == '+' && out.is_empty()) {
            out.push(c);
        }
    }
    if out.bytes().any(|b| b.is_ascii_digit()) {
        out
    } else {
        String::new()
    }
}
