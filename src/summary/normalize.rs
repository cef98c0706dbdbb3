use crate::error::SummariseError;

/// Unicode whitespace plus the ASCII file/group/record/unit separators
/// (U+001C..=U+001F), which `str::trim` keeps.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Trims the input, rejects it if nothing is left, and cuts it down to
/// `max_chars` characters.
///
/// The cut is a plain character offset; it makes no attempt to land on a
/// word boundary. Truncation is silent.
pub fn normalize(raw: &str, max_chars: usize) -> Result<String, SummariseError> {
    let text = raw.trim_matches(is_blank);
    if text.is_empty() {
        return Err(SummariseError::Validation("empty input".into()));
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len());

    Ok(text[..cut].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 10_000;

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(normalize("  \n hello world \t", LIMIT).unwrap(), "hello world");
    }

    #[test]
    fn rejects_empty_and_whitespace_only() {
        for raw in ["", " ", "\n\t  \r\n", "\u{3000}\u{00a0}"] {
            match normalize(raw, LIMIT) {
                Err(SummariseError::Validation(msg)) => assert_eq!(msg, "empty input"),
                other => panic!("{raw:?} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn information_separators_count_as_blank() {
        assert!(matches!(
            normalize("\u{1c}\u{1d}\u{1e}\u{1f}", LIMIT),
            Err(SummariseError::Validation(_))
        ));
        assert_eq!(
            normalize("\u{1f} \u{1c}report\u{1e}body\u{1d}\n", LIMIT).unwrap(),
            "report\u{1e}body"
        );
    }

    #[test]
    fn long_input_is_cut_to_exact_budget() {
        let raw = "a".repeat(50_000);
        let out = normalize(&raw, LIMIT).unwrap();
        assert_eq!(out.chars().count(), LIMIT);
    }

    #[test]
    fn input_at_budget_is_untouched() {
        let raw = "b".repeat(LIMIT);
        assert_eq!(normalize(&raw, LIMIT).unwrap(), raw);
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        let raw = "é".repeat(20);
        let out = normalize(&raw, 7).unwrap();
        assert_eq!(out, "é".repeat(7));
        assert_eq!(out.len(), 14);
    }

    #[test]
    fn cut_ignores_word_boundaries() {
        assert_eq!(normalize("summarisation", 5).unwrap(), "summa");
    }

    #[test]
    fn truncation_happens_after_trimming() {
        assert_eq!(normalize("     abcdef", 3).unwrap(), "abc");
    }

    #[test]
    fn truncation_is_deterministic() {
        let raw = "The quick brown fox jumps over the lazy dog. ".repeat(400);
        assert_eq!(normalize(&raw, 1234).unwrap(), normalize(&raw, 1234).unwrap());
    }

    #[test]
    fn any_non_blank_input_yields_bounded_non_empty_text() {
        let samples = [
            "x",
            "  y  ",
            "hello\u{00a0}there",
            "日本語のテキスト",
            "🙂 emoji first",
        ];
        for raw in samples {
            for limit in [1, 3, 16, LIMIT] {
                let out = normalize(raw, limit).unwrap();
                assert!(!out.is_empty());
                assert!(out.chars().count() <= limit);
            }
        }
    }
}
