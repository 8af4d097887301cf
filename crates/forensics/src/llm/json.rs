//! Locating a JSON object inside free-form model output.

use tracing::debug;

/// Returns the JSON object embedded in `text`: the body of a fenced code
/// block if present, otherwise the first balanced `{...}` span.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(body) = fenced_block(text) {
        let body = body.trim();
        if body.starts_with('{') {
            debug!("Found JSON in code block");
            return balanced_object(body).or(Some(body));
        }
    }

    balanced_object(text)
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // skip the language tag on the opening line
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &byte) in text.as_bytes()[start..].iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match byte {
            b'\\' if in_string => escape_next = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
