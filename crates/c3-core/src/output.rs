//! Splitting result text into display-safe chunks.

/// Separator appended to every result before it is chunked.
pub const DEFAULT_SEPARATOR: &str = "\n";

/// Splits `text` (plus `separator`) into chunks of at most `width` bytes.
///
/// Each chunk ends at the last newline inside the width budget when there is
/// one, then at the last whitespace, otherwise it is cut at the budget (on a
/// character boundary). The last chunk always ends with the final character
/// of the separated text.
pub fn split_output(text: &str, separator: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let full = format!("{text}{separator}");
    let mut chunks = Vec::new();
    let mut rest = full.as_str();

    while !rest.is_empty() {
        if rest.len() <= width {
            chunks.push(rest.to_string());
            break;
        }

        let mut budget = width;
        while !rest.is_char_boundary(budget) {
            budget -= 1;
        }
        if budget == 0 {
            // A single character wider than the budget still has to go out.
            budget = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }

        let window = &rest[..budget];
        let cut = match window.rfind('\n') {
            Some(newline) => newline + 1,
            None => window
                .char_indices()
                .rev()
                .find(|(_, c)| c.is_whitespace())
                .map_or(budget, |(at, c)| at + c.len_utf8()),
        };

        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    chunks
}
