//! Model output sanitization.
//!
//! Model completions frequently wrap JSON in markdown code fences or
//! surround it with prose. The sanitizer extracts the first balanced
//! JSON value from the raw text. It never fails: when no balanced
//! value can be found it returns the input unchanged and leaves the
//! rejection to the validator.

/// Extract the first balanced JSON object or array from raw model text.
///
/// Strips a leading/trailing markdown code fence (with or without a
/// language tag), then scans from the first `{` or `[` tracking bracket
/// depth while honoring string literals and escape sequences. Running a
/// sanitized output through again returns it unchanged.
///
/// # Examples
///
/// ```
/// use dramaturge_pipeline::sanitize_response;
///
/// let raw = "Here you go:\n```json\n{\"tccs\": []}\n```\nLet me know!";
/// assert_eq!(sanitize_response(raw), "{\"tccs\": []}");
/// ```
pub fn sanitize_response(raw: &str) -> String {
    let content = strip_code_fence(raw);

    let Some(start) = content.find(['{', '[']) else {
        tracing::warn!("No JSON structure found in model response");
        return raw.to_string();
    };

    match extract_balanced(&content[start..]) {
        Some(span) => span.to_string(),
        None => {
            tracing::warn!("Unbalanced JSON brackets in model response, returning as-is");
            raw.to_string()
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let mut content = raw.trim();
    if let Some(rest) = content.strip_prefix("```") {
        // Drop the language tag, if any, with the fence line.
        content = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => rest,
        };
    }
    if let Some(rest) = content.trim_end().strip_suffix("```") {
        content = rest;
    }
    content.trim()
}

/// Scan for the end of the first balanced JSON value. The input must
/// start at an opening bracket. Returns `None` when the text ends with
/// brackets still open.
fn extract_balanced(content: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in content.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&content[..i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_with_surrounding_prose() {
        let raw = "Sure, here's the analysis:\n```json\n{\"tccs\": [{\"id\": 1}]}\n```\nHope that helps!";
        assert_eq!(sanitize_response(raw), "{\"tccs\": [{\"id\": 1}]}");
    }

    #[test]
    fn test_fence_without_language_tag() {
        let raw = "```\n[1, 2, 3]\n```";
        assert_eq!(sanitize_response(raw), "[1, 2, 3]");
    }

    #[test]
    fn test_bare_json_passes_through() {
        let raw = r#"{"rankings": {"a_line": null}}"#;
        assert_eq!(sanitize_response(raw), raw);
    }

    #[test]
    fn test_idempotent_on_sanitized_output() {
        let raw = "Result:\n```json\n{\"a\": [1, {\"b\": 2}]}\n```";
        let once = sanitize_response(raw);
        assert_eq!(sanitize_response(&once), once);
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let raw = r#"Here: {"text": "a } inside \" and {{ more"} trailing"#;
        assert_eq!(
            sanitize_response(raw),
            r#"{"text": "a } inside \" and {{ more"}"#
        );
    }

    #[test]
    fn test_unbalanced_returns_input_unchanged() {
        let raw = r#"{"tccs": [{"id": 1}"#;
        assert_eq!(sanitize_response(raw), raw);
    }

    #[test]
    fn test_no_json_returns_input_unchanged() {
        let raw = "I could not analyze this script.";
        assert_eq!(sanitize_response(raw), raw);
    }

    #[test]
    fn test_trailing_prose_after_object_dropped() {
        let raw = r#"{"done": true} Anything else?"#;
        assert_eq!(sanitize_response(raw), r#"{"done": true}"#);
    }

    #[test]
    fn test_array_payload() {
        let raw = "```json\n[{\"x\": \"[not a bracket]\"}]\n```";
        assert_eq!(sanitize_response(raw), "[{\"x\": \"[not a bracket]\"}]");
    }
}
