// file: src/backend/response.rs
// description: scrubbing of model responses wrapped in incidental formatting

/// Removes fenced-code wrappers a model may put around structured output.
/// Idempotent: scrubbing already-clean text is a no-op.
pub fn strip_code_fences(response: &str) -> String {
    response
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Locates the first balanced JSON object substring, tolerating prose before
/// or after it. Respects string literals and escapes while matching braces.
pub fn find_json_object(text: &str) -> Option<&str> {
    find_balanced(text, '{', '}')
}

/// Locates the first balanced JSON array substring.
pub fn find_json_array(text: &str) -> Option<&str> {
    find_balanced(text, '[', ']')
}

fn find_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
