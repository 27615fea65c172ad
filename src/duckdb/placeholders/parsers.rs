pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx..).is_some_and(|rest| rest.starts_with(b"--"))
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx..).is_some_and(|rest| rest.starts_with(b"/*"))
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx..).is_some_and(|rest| rest.starts_with(b"*/"))
}

fn is_tag_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `$tag$` or `$$` opening a dollar-quoted block at `start`. Returns the tag and the
/// index of the opener's closing `$`.
///
/// A tag may not begin with a digit, so `$1` stays a positional parameter.
pub(super) fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let body = bytes.get(start + 1..)?;
    let len = body.iter().position(|&b| b == b'$')?;
    let tag = &body[..len];
    if !tag.iter().copied().all(is_tag_byte) || tag.first().is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let tag = std::str::from_utf8(tag).ok()?;
    Some((tag.to_owned(), start + 1 + len))
}

/// True when the closing `$tag$` starts at `idx`.
pub(super) fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let Some(rest) = bytes.get(idx..) else {
        return false;
    };
    rest.first() == Some(&b'$')
        && rest[1..].starts_with(tag.as_bytes())
        && rest.get(1 + tag.len()) == Some(&b'$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollar_openers() {
        assert_eq!(try_start_dollar_quote(b"$$ body", 0), Some((String::new(), 1)));
        assert_eq!(try_start_dollar_quote(b"x $fn_1$", 2), Some(("fn_1".into(), 7)));
        assert_eq!(try_start_dollar_quote(b"$1 + $2", 0), None);
        assert_eq!(try_start_dollar_quote(b"$a-b$", 0), None);
        assert_eq!(try_start_dollar_quote(b"$unterminated", 0), None);
        assert_eq!(try_start_dollar_quote(b"$", 0), None);
    }

    #[test]
    fn closing_tag_at_end_of_input() {
        assert!(matches_tag(b"body $fn$", 5, "fn"));
        assert!(matches_tag(b"$$", 0, ""));
        // Cut short before the final `$`.
        assert!(!matches_tag(b"body $fn", 5, "fn"));
        assert!(!matches_tag(b"$", 0, ""));
        assert!(!matches_tag(b"$fx$", 0, "fn"));
        assert!(!matches_tag(b"ab", 5, "fn"));
    }

    #[test]
    fn comment_markers_need_both_bytes() {
        assert!(is_line_comment_start(b"a -- c", 2));
        assert!(!is_line_comment_start(b"a -", 2));
        assert!(is_block_comment_start(b"/*", 0));
        assert!(!is_block_comment_end(b"*", 0));
        assert!(!is_block_comment_end(b"", 3));
    }
}
