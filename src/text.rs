use unicode_normalization::UnicodeNormalization;

pub const ELLIPSIS: char = '…';

/// Cuts `text` to at most `max_chars` characters, ending in [`ELLIPSIS`] when
/// anything was dropped.
pub fn truncate(text: &str, max_chars: usize) -> String {
    // Composed form so a cut never separates a base letter from its accent.
    let composed: String = text.nfc().collect();
    if composed.chars().count() <= max_chars {
        return composed;
    }
    if max_chars == 0 {
        return String::new();
    }

    let kept: String = composed.chars().take(max_chars - 1).collect();
    let mut out = kept.trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate("Song", 35), "Song");
        assert_eq!(truncate("", 3), "");
    }

    #[test]
    fn long_text_ends_with_ellipsis_within_bound() {
        let out = truncate("Symphony No. 9 – Beethoven", 10);
        assert!(out.chars().count() <= 10);
        assert!(out.ends_with(ELLIPSIS));
        assert!(out.starts_with("Symphony"));
    }

    #[test]
    fn exact_length_is_not_cut() {
        assert_eq!(truncate("abcde", 5), "abcde");
        assert_eq!(truncate("abcdef", 5), "abcd…");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let out = truncate("ÄÖÜäöüß", 4);
        assert_eq!(out, "ÄÖÜ…");
    }

    #[test]
    fn decomposed_accents_are_kept_whole() {
        let decomposed = "e\u{301}e\u{301}e\u{301}e\u{301}";
        let out = truncate(decomposed, 3);
        assert_eq!(out, "éé…");
    }

    #[test]
    fn zero_budget_yields_empty_label() {
        assert_eq!(truncate("anything", 0), "");
    }
}
