//! Shared utility functions.

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Truncate `s` to `max_bytes`, appending a note with the number of bytes cut.
pub fn truncate_with_notice(s: &str, max_bytes: usize) -> String {
    let kept = truncate_str(s, max_bytes);
    if kept.len() == s.len() {
        return s.to_string();
    }
    format!("{}\n... [truncated {} bytes]", kept, s.len() - kept.len())
}

/// Pull a JSON object out of a model response.
///
/// Accepts a fenced block (`` ```json `` or bare `` ``` ``) or the first
/// balanced, non-empty `{ ... }` span of the text that parses.
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    if let Some(fenced) = fenced_block(text)
        && let Ok(value) = serde_json::from_str(fenced)
    {
        return Some(value);
    }

    text.match_indices('{')
        .filter_map(|(start, _)| balanced_object(&text[start..]))
        .filter_map(|candidate| serde_json::from_str::<serde_json::Value>(candidate).ok())
        .find(|value| value.as_object().is_some_and(|object| !object.is_empty()))
}

/// The `{ ... }` prefix of `text` with balanced braces, honouring strings
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}
