#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    /// `escapes` is set for `E'...'` strings, where a backslash escapes the next byte.
    SingleQuoted { escapes: bool },
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// True when the quote at `idx` is preceded by a standalone `E`/`e` prefix.
pub(super) fn is_escape_string_start(bytes: &[u8], idx: usize) -> bool {
    if idx == 0 || !matches!(bytes[idx - 1], b'E' | b'e') {
        return false;
    }
    idx < 2 || !(bytes[idx - 2].is_ascii_alphanumeric() || bytes[idx - 2] == b'_')
}
