//! Bracket tokenizer — splits a bracket-delimited string into top-level
//! tokens.
//!
//! Nested brackets are preserved as raw text inside their parent token, so a
//! recognizer can re-tokenize a token to descend one level. Text outside any
//! bracket is trimmed and comma-split. Collectors sometimes cut a line short
//! and start the next event without closing the previous bracket; when the
//! cut fell just after a closed inner bracket, the final unterminated
//! top-level token is emitted rather than rejected.

use crate::error::TokenError;

pub fn tokenize(text: &str) -> Result<Vec<String>, TokenError> {
    let mut tokens = Vec::new();
    let mut buffer = String::new();
    let mut bare = String::new();
    let mut depth: u32 = 0;

    for ch in text.chars() {
        match ch {
            '[' => {
                if depth == 0 {
                    flush_bare(&mut bare, &mut tokens);
                    buffer.clear();
                } else {
                    buffer.push('[');
                }
                depth += 1;
            }
            ']' => {
                if depth == 0 {
                    return Err(TokenError::Unbalanced(text.to_string()));
                }
                depth -= 1;
                if depth == 0 {
                    tokens.push(std::mem::take(&mut buffer));
                } else {
                    buffer.push(']');
                }
            }
            _ => {
                if depth == 0 {
                    bare.push(ch);
                } else {
                    buffer.push(ch);
                }
            }
        }
    }

    flush_bare(&mut bare, &mut tokens);

    match depth {
        0 => {}
        // Unterminated top-level bracket cut off right after a closed inner
        // one: the collector started the next event mid-line. Emit what was
        // collected. A dangling bracket with no inner close is plain
        // corruption, not truncation.
        1 if buffer.ends_with(']') => tokens.push(buffer),
        _ => return Err(TokenError::Unbalanced(text.to_string())),
    }

    Ok(tokens)
}

/// Emit pending depth-0 text, trimmed and split on commas. Text inside a
/// bracket is never comma-split; only bare segments are.
fn flush_bare(bare: &mut String, tokens: &mut Vec<String>) {
    for piece in bare.split(',') {
        let piece = piece.trim();
        if !piece.is_empty() {
            tokens.push(piece.to_string());
        }
    }
    bare.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_bracket_pair() {
        assert_eq!(tokenize("[GC 1234]").unwrap(), vec!["GC 1234"]);
    }

    #[test]
    fn test_nested_brackets_kept_raw() {
        let tokens = tokenize("[GC [PSYoungGen: 1K->2K(3K)] 4K->5K(6K), 0.1 secs]").unwrap();
        assert_eq!(
            tokens,
            vec!["GC [PSYoungGen: 1K->2K(3K)] 4K->5K(6K), 0.1 secs"]
        );
    }

    #[test]
    fn test_bare_text_is_comma_split() {
        let tokens = tokenize("[ParNew: 1K->2K(3K)] 4K->5K(6K), 0.2 secs").unwrap();
        assert_eq!(tokens, vec!["ParNew: 1K->2K(3K)", "4K->5K(6K)", "0.2 secs"]);
    }

    #[test]
    fn test_commas_inside_brackets_not_split() {
        let tokens = tokenize("[Times: user=0.1 sys=0.0, real=0.1 secs]").unwrap();
        assert_eq!(tokens, vec!["Times: user=0.1 sys=0.0, real=0.1 secs"]);
    }

    #[test]
    fn test_sibling_brackets() {
        let tokens = tokenize("[a] [b]").unwrap();
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[test]
    fn test_extra_close_is_unbalanced() {
        assert!(matches!(tokenize("[a]]"), Err(TokenError::Unbalanced(_))));
    }

    #[test]
    fn test_unterminated_top_level_token_is_emitted() {
        // Truncated mid-line by the next event: the outer bracket never
        // closes but the inner one does.
        let tokens = tokenize("[GC 25.285: [ParNew: 1K->2K(3K), 0.03 secs]").unwrap();
        assert_eq!(tokens, vec!["GC 25.285: [ParNew: 1K->2K(3K), 0.03 secs]"]);
    }

    #[test]
    fn test_unterminated_without_inner_close_is_unbalanced() {
        assert!(matches!(tokenize("[GC 1K->"), Err(TokenError::Unbalanced(_))));
    }

    #[test]
    fn test_deeply_unterminated_is_unbalanced() {
        assert!(matches!(tokenize("[a [b [c"), Err(TokenError::Unbalanced(_))));
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
    }
}
