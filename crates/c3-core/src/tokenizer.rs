//! Console line tokenizer.
//!
//! Handles:
//! - Whitespace-separated tokens
//! - Double-quoted spans as part of a single token, quotes removed
//! - Backslashes inside quotes kept literally, together with the character
//!   they escape (so `\"` does not end the span)

/// Splits one console line into tokens.
///
/// An unterminated quote runs to the end of the line. Returns an empty vector
/// for a blank line.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape_next = false;

    for ch in input.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_quotes => {
                current.push(ch);
                escape_next = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() || quoted {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(tokenize("c3 spawn bandit"), vec!["c3", "spawn", "bandit"]);
    }

    #[test]
    fn test_tokenize_quoted_span() {
        let tokens = tokenize(r#"cmd sub "a b" -x 3"#);
        assert_eq!(tokens, vec!["cmd", "sub", "a b", "-x", "3"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_whitespace_only() {
        assert!(tokenize("   \t  ").is_empty());
    }

    #[test]
    fn test_tokenize_empty_quotes_is_a_token() {
        assert_eq!(tokenize(r#"say """#), vec!["say", ""]);
    }

    #[test]
    fn test_tokenize_escape_kept_literally() {
        let tokens = tokenize(r#"say "a \"b\" c""#);
        assert_eq!(tokens, vec!["say", r#"a \"b\" c"#]);
    }

    #[test]
    fn test_tokenize_quote_inside_word_joins() {
        assert_eq!(tokenize(r#"--name="Lydia Housecarl""#), vec!["--name=Lydia Housecarl"]);
    }

    #[test]
    fn test_tokenize_unterminated_quote() {
        assert_eq!(tokenize(r#"say "hello there"#), vec!["say", "hello there"]);
    }

    #[test]
    fn test_single_quotes_are_plain_text() {
        assert_eq!(tokenize("say 'a b'"), vec!["say", "'a", "b'"]);
    }
}
