use crate::Element;

const INDENT: &str = "  ";

fn is_blank(text: &Option<String>) -> bool {
    text.as_deref().is_none_or(|t| t.trim().is_empty())
}

/// Pretty-print `element` in place, two spaces per level.
///
/// Only unset or whitespace-only `text`/`tail` slots are rewritten, so running
/// it again on an indented tree gives the same result.
pub fn indent(element: &mut Element, depth: usize) -> &mut Element {
    let newline = format!("\n{}", INDENT.repeat(depth));

    if !element.children.is_empty() {
        if is_blank(&element.text) {
            element.text = Some(format!("{newline}{INDENT}"));
        }
        if is_blank(&element.tail) {
            element.tail = Some(newline.clone());
        }
        for child in element.children.iter_mut() {
            indent(child, depth + 1);
        }
        // closing tag of this element lines up with its opening tag
        if let Some(last) = element.children.last_mut() {
            if is_blank(&last.tail) {
                last.tail = Some(newline);
            }
        }
    } else if depth > 0 && is_blank(&element.tail) {
        element.tail = Some(newline);
    }
    element
}
