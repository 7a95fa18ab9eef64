use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

#[allow(clippy::expect_used)]
static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x1b\x{9b}][\[()#;?]*(?:[0-9]{1,4}(?:;[0-9]{0,4})*)?[0-9A-ORZcf-nqry=><]")
        .expect("valid ANSI regex")
});

/// Remove terminal escape sequences (colors, cursor movement).
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_RE.replace_all(text, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_colors_and_cursor_codes() {
        assert_eq!(strip_ansi("\x1b[32m✔\x1b[0m Installed pdf"), "✔ Installed pdf");
        assert_eq!(strip_ansi("\x1b[2K\x1b[1Gdone"), "done");
        assert_eq!(strip_ansi("\x1b[?25lhidden cursor\x1b[?25h"), "hidden cursor");
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(strip_ansi("plain"), Cow::Borrowed("plain")));
    }
}
