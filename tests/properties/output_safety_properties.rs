use proptest::prelude::*;

use promptfmt::cli::commands::mcp::{contains_ansi, strip_ansi};

proptest! {
    #[test]
    fn test_strip_ansi_removes_every_escape(text in ".{0,120}", code in 0u8..108) {
        let styled = format!("\x1b[{code}m{text}\x1b[0m");
        prop_assert!(!contains_ansi(&strip_ansi(&styled)));
    }

    #[test]
    fn test_strip_ansi_keeps_plain_text(text in "[^\x1b\u{9b}]{0,120}") {
        prop_assert_eq!(strip_ansi(&text), text);
    }
}
