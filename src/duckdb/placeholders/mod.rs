//! Locate `?` placeholders for the interpolation path.
//!
//! Warning: this is a lightweight state machine. It skips quoted strings, quoted
//! identifiers, comments and dollar-quoted blocks, but it does not parse SQL.

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_line_comment_start, matches_tag,
    try_start_dollar_quote,
};
use scanner::{State, is_escape_string_start};

/// Byte offsets of every `?` placeholder in `sql`, in order.
#[must_use]
pub fn placeholder_positions(sql: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => {
                    state = State::SingleQuoted {
                        escapes: is_escape_string_start(bytes, idx),
                    }
                }
                b'"' => state = State::DoubleQuoted,
                b'?' => positions.push(idx),
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                _ => {}
            },
            State::SingleQuoted { escapes } => {
                if escapes && b == b'\\' {
                    idx += 1;
                } else if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // doubled quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    positions
}

/// Number of `?` placeholders in `sql`.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_positions(sql).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_bare_placeholders() {
        let sql = "SELECT * FROM users WHERE (name = ? OR name = ?) AND age > ?";
        assert_eq!(count_placeholders(sql), 3);
        assert_eq!(placeholder_positions("?, ?"), vec![0, 3]);
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select '?', \"a?b\", ? -- ?\n/* ? /* ? */ ? */ from t where a = ?";
        assert_eq!(count_placeholders(sql), 2);
    }

    #[test]
    fn skips_escaped_and_doubled_quotes() {
        let sql = "select 'it''s ?', E'\\'?', ?";
        assert_eq!(count_placeholders(sql), 1);
    }

    #[test]
    fn backslash_is_literal_outside_escape_strings() {
        let sql = "select 'C:\\', ?";
        assert_eq!(count_placeholders(sql), 1);
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let sql = "select $q$ ? $q$, $$?$$, ?";
        assert_eq!(count_placeholders(sql), 1);
    }

    #[test]
    fn positional_dollar_params_are_not_quotes() {
        let sql = "select $1, ?";
        assert_eq!(count_placeholders(sql), 1);
    }
}
