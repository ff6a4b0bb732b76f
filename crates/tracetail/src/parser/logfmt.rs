//! Key/value decoding of the payload interior.
//!
//! Whitespace-separated `key=value` tokens. A value opening with `"` runs
//! verbatim, real newlines included, until an unescaped closing quote; the
//! backslash escapes the quote character and nothing else. Tokens without an
//! `=` are skipped rather than failing the candidate.

/// Decode the payload interior into key/value pairs, in encounter order.
pub fn decode_pairs(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }

        if chars.peek() != Some(&'=') {
            // Bare token; skip it and move on.
            continue;
        }
        chars.next();

        let value = if chars.peek() == Some(&'"') {
            chars.next();
            let mut val = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '\\' if chars.peek() == Some(&'"') => {
                        val.push('"');
                        chars.next();
                    }
                    '"' => break,
                    _ => val.push(c),
                }
            }
            val
        } else {
            let mut val = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                val.push(c);
                chars.next();
            }
            val
        };

        if !key.is_empty() {
            pairs.push((key, value));
        }
    }

    pairs
}
