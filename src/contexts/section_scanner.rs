//! Line helpers shared by the parsers that turn freeform LLM answers into records.
//!
//! Answers are scanned line by line. A line that opens with a known header
//! (`Steps:`, `Plan:`, ...) switches the active section; everything else is
//! accumulated into whatever section is active.

/// Strips markdown decoration the model likes to put around headers:
/// leading `#`, bullets, and bold markers.
fn undecorate(line: &str) -> &str {
    let mut rest = line.trim();
    loop {
        let next = rest
            .trim_start_matches('#')
            .trim_start_matches("**")
            .trim_start_matches("__")
            .trim_start();
        let next = match next.strip_prefix("- ").or_else(|| next.strip_prefix("* ")) {
            Some(stripped) => stripped.trim_start(),
            None => next,
        };
        if next == rest {
            return rest;
        }
        rest = next;
    }
}

/// Checks whether `line` starts with one of `headers` (case-insensitive, each
/// given in lowercase including its trailing colon).
///
/// Returns the index of the matched header and the text after it on the same line.
pub fn match_header<'a>(line: &'a str, headers: &[&str]) -> Option<(usize, &'a str)> {
    let bare = undecorate(line);
    let lower = bare.to_lowercase();

    for (idx, header) in headers.iter().enumerate() {
        let name = header.trim_end_matches(':');
        if !lower.starts_with(name) {
            continue;
        }
        let Some(after_name) = bare.get(name.len()..) else {
            continue;
        };
        // Accept "Steps:", "Steps**:" and "Steps:**"
        let after_name = after_name.trim_start_matches('*');
        if let Some(rest) = after_name.strip_prefix(':') {
            let rest = rest.trim_start_matches('*').trim();
            return Some((idx, rest));
        }
    }
    None
}

/// Strips a list marker from the front of a trimmed line.
///
/// Recognizes bullets (`- `, `* `, `• `) and numbering (`1. `, `12) `).
/// Returns `None` when the line carries no marker.
pub fn strip_list_marker(line: &str) -> Option<&str> {
    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return Some(rest.trim());
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    let rest = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") "))?;
    Some(rest.trim())
}

/// Adds an item to a list section; unmarked lines become their own entry.
pub fn push_item(items: &mut Vec<String>, line: &str) {
    let item = strip_list_marker(line).unwrap_or(line).trim();
    if !item.is_empty() {
        items.push(item.to_string());
    }
}

/// Adds a line to a list section where unmarked lines continue the previous entry.
pub fn push_or_continue(items: &mut Vec<String>, line: &str) {
    match strip_list_marker(line) {
        Some(item) if !item.is_empty() => items.push(item.to_string()),
        Some(_) => {}
        None => match items.last_mut() {
            Some(last) => {
                last.push(' ');
                last.push_str(line.trim());
            }
            None => items.push(line.trim().to_string()),
        },
    }
}

/// Appends a line to free-text section content.
pub fn push_text(text: &mut String, line: &str) {
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(line);
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADERS: &[&str] = &["reasoning:", "steps:", "missing information:"];

    #[test]
    fn test_match_header_plain_and_decorated() {
        assert_eq!(match_header("Reasoning: it is simple", HEADERS), Some((0, "it is simple")));
        assert_eq!(match_header("- Steps:", HEADERS), Some((1, "")));
        assert_eq!(match_header("**Missing Information:**", HEADERS), Some((2, "")));
        assert_eq!(match_header("## STEPS:", HEADERS), Some((1, "")));
        assert_eq!(match_header("**Steps**: one", HEADERS), Some((1, "one")));
    }

    #[test]
    fn test_match_header_requires_colon() {
        assert_eq!(match_header("Steps are below", HEADERS), None);
        assert_eq!(match_header("1. Reasoning: nested", HEADERS), None);
    }

    #[test]
    fn test_strip_list_marker() {
        assert_eq!(strip_list_marker("- item"), Some("item"));
        assert_eq!(strip_list_marker("• item"), Some("item"));
        assert_eq!(strip_list_marker("12. item"), Some("item"));
        assert_eq!(strip_list_marker("3) item"), Some("item"));
        assert_eq!(strip_list_marker("3.5 percent"), None);
        assert_eq!(strip_list_marker("plain text"), None);
    }

    #[test]
    fn test_push_or_continue_appends_to_last() {
        let mut items = Vec::new();
        push_or_continue(&mut items, "1. Check priority");
        push_or_continue(&mut items, "when the issue is created");
        push_or_continue(&mut items, "2. Assign");
        assert_eq!(items, vec!["Check priority when the issue is created", "Assign"]);
    }

    #[test]
    fn test_push_item_keeps_unmarked_lines_separate() {
        let mut items = Vec::new();
        push_item(&mut items, "- Who is the lead?");
        push_item(&mut items, "Which project?");
        assert_eq!(items, vec!["Who is the lead?", "Which project?"]);
    }
}
