//! Cleanup of raw OCR output
//!
//! OCR on a subtitle band picks up frame counters, time-codes, caption
//! badges and stray punctuation in front of the actual line. Only that
//! leading debris is removed; the subtitle text itself is left alone.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

static LEADING_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s*").expect("valid regex"));

static LEADING_TIMECODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}(?::\d{2})?\s*").expect("valid regex"));

static CAPTION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:PR|CC|SD|HD|SUB|CAP)\b\s*").expect("valid regex"));

static UPPERCASE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2,3}\s+").expect("valid regex"));

static IE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^ie\b\s*").expect("valid regex"));

static LEADING_NON_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\p{L}]+").expect("valid regex"));

/// Normalize raw OCR text into the subtitle line
///
/// Never fails; an all-noise input comes back empty, which callers read as
/// "no subtitle detected". Applying it twice gives the same result as once.
pub fn clean(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw, " ");
    let mut text = collapsed.trim().to_string();

    loop {
        let stripped = strip_leading_noise(&text);
        if stripped == text {
            break;
        }
        text = stripped;
    }

    if text != raw {
        debug!("Cleaned OCR text {:?} -> {:?}", raw, text);
    }
    text
}

/// One pass of prefix removal
fn strip_leading_noise(text: &str) -> String {
    let mut rest = text;

    rest = strip(&LEADING_DIGITS, rest);
    rest = strip(&LEADING_TIMECODE, rest);

    let before_token = rest;
    rest = strip(&CAPTION_TOKEN, rest);
    if rest.len() == before_token.len() {
        rest = strip_uppercase_prefix(rest);
    }

    rest = strip(&IE_TOKEN, rest);
    rest = strip(&LEADING_NON_LETTERS, rest);

    rest.to_string()
}

fn strip<'a>(pattern: &Regex, text: &'a str) -> &'a str {
    match pattern.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Drop a 2-3 letter uppercase badge, but only in front of mixed-case text;
/// an all-caps subtitle line keeps its short words
fn strip_uppercase_prefix(text: &str) -> &str {
    match UPPERCASE_PREFIX.find(text) {
        Some(m) if text[m.end()..].chars().any(char::is_lowercase) => &text[m.end()..],
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_timecode_and_badge() {
        assert_eq!(clean("12 00:01:23 PR Hello world"), "Hello world");
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(clean("   "), "");
        assert_eq!(clean(""), "");
        assert_eq!(clean("\n\t \n"), "");
    }

    #[test]
    fn test_pure_noise() {
        assert_eq!(clean("12 :: -- 00:00"), "");
        assert_eq!(clean("|||"), "");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean("  Where   are\n you\tgoing?  "), "Where are you going?");
    }

    #[test]
    fn test_short_timecode() {
        assert_eq!(clean("1:23 Nice to meet you"), "Nice to meet you");
        assert_eq!(clean("01:23:45 Nice to meet you"), "Nice to meet you");
    }

    #[test]
    fn test_caption_badges_case_insensitive() {
        assert_eq!(clean("cc Good morning"), "Good morning");
        assert_eq!(clean("Sub: Good morning"), "Good morning");
        assert_eq!(clean("HD Good morning"), "Good morning");
    }

    #[test]
    fn test_badge_must_be_whole_token() {
        assert_eq!(clean("Subway is closed"), "Subway is closed");
        assert_eq!(clean("Process it"), "Process it");
        assert_eq!(clean("Capital city"), "Capital city");
        assert_eq!(clean("Hdmi cable"), "Hdmi cable");
    }

    #[test]
    fn test_bare_uppercase_prefix() {
        assert_eq!(clean("XQ I told you so"), "I told you so");
        assert_eq!(clean("ABC Hello there"), "Hello there");
    }

    #[test]
    fn test_all_caps_line_survives() {
        assert_eq!(clean("WE ARE GOING HOME"), "WE ARE GOING HOME");
    }

    #[test]
    fn test_ie_misread() {
        assert_eq!(clean("ie Hello"), "Hello");
        assert_eq!(clean("IE. Hello"), "Hello");
        assert_eq!(clean("ieHello"), "ieHello");
    }

    #[test]
    fn test_leading_punctuation() {
        assert_eq!(clean("- \"Really?\""), "Really?\"");
        assert_eq!(clean("...and then"), "and then");
    }

    #[test]
    fn test_interior_text_untouched() {
        assert_eq!(clean("Hello 12 PR world 00:01"), "Hello 12 PR world 00:01");
    }

    #[test]
    fn test_accented_text_kept() {
        assert_eq!(clean("3 ¿Qué pasa?"), "Qué pasa?");
        assert_eq!(clean("Élan vital"), "Élan vital");
    }

    #[test]
    fn test_stacked_prefixes() {
        assert_eq!(clean("PR CC SD Hello"), "Hello");
        assert_eq!(clean("12 ie 7 CC Hi"), "Hi");
    }

    #[test]
    fn test_output_never_starts_with_digit() {
        for input in ["42", "1 2 3 go", "007 Bond", "12:34:56"] {
            let cleaned = clean(input);
            assert!(
                !cleaned.starts_with(|c: char| c.is_ascii_digit()),
                "{:?} -> {:?}",
                input,
                cleaned
            );
        }
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "12 00:01:23 PR Hello world",
            "   ",
            "PR CC SD Hello",
            "cc ie 12 -- Hi there",
            "Sub: Good morning",
            "XQ I told you so",
            "WE ARE GOING HOME",
            "OK",
            "HD",
            "ie",
            "3 ¿Qué pasa?",
            "- \"Really?\"",
            "a  b   c",
            "SUB SUB sub Title",
            "CAP12 text",
        ];

        for sample in samples {
            let once = clean(sample);
            let twice = clean(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
        }
    }
}
