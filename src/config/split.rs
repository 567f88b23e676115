//! Splitting with escapable separators.
//!
//! Used for list-valued command line flags where a separator may legitimately
//! occur inside an item (e.g. a header value containing `|`).

/// Split `input` on every unescaped `separator`.
///
/// `escape` immediately followed by `separator` produces a literal separator.
/// An escape before any other character is kept as-is.
pub fn split_escaped(input: &str, separator: char, escape: char) -> Vec<String> {
    split_escaped_any(input, &[separator], escape)
}

/// Like [`split_escaped`], but any character in `separators` splits.
pub fn split_escaped_any(input: &str, separators: &[char], escape: char) -> Vec<String> {
    if input.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == escape {
            match chars.peek() {
                Some(next) if separators.contains(next) => {
                    current.push(*next);
                    chars.next();
                }
                _ => current.push(c),
            }
        } else if separators.contains(&c) {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);

    parts
}
