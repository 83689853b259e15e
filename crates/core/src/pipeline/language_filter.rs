use std::ops::RangeInclusive;

/// Decides whether detected text belongs to the source language.
///
/// Pure and stateless; swapping the implementation retargets the pipeline
/// to another source language without touching any other component.
pub trait LanguageFilter: Send {
    fn matches(&self, text: &str) -> bool;
}

/// Accepts text containing at least one character from a set of Unicode
/// blocks. Empty and whitespace-only text is always rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptFilter {
    ranges: Vec<RangeInclusive<char>>,
}

impl ScriptFilter {
    pub fn new(ranges: Vec<RangeInclusive<char>>) -> Self {
        Self { ranges }
    }

    /// Hiragana, Katakana and CJK unified ideographs.
    pub fn japanese() -> Self {
        Self::new(vec![
            '\u{3040}'..='\u{309F}',
            '\u{30A0}'..='\u{30FF}',
            '\u{4E00}'..='\u{9FAF}',
        ])
    }

    /// Hangul syllables, Jamo and compatibility Jamo.
    pub fn korean() -> Self {
        Self::new(vec![
            '\u{AC00}'..='\u{D7AF}',
            '\u{1100}'..='\u{11FF}',
            '\u{3130}'..='\u{318F}',
        ])
    }

    /// CJK unified ideographs and extension A.
    pub fn chinese() -> Self {
        Self::new(vec!['\u{4E00}'..='\u{9FFF}', '\u{3400}'..='\u{4DBF}'])
    }

    /// Filter for an ISO 639-1 source language code, if one is known.
    pub fn for_language(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "ja" | "jpn" => Some(Self::japanese()),
            "ko" | "kor" => Some(Self::korean()),
            "zh" | "zh-cn" | "zh-tw" | "zh-hans" | "zh-hant" | "chi" => Some(Self::chinese()),
            _ => None,
        }
    }
}

impl LanguageFilter for ScriptFilter {
    fn matches(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        text.chars()
            .any(|ch| self.ranges.iter().any(|r| r.contains(&ch)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::hiragana("こんにちは")]
    #[case::katakana("エラー")]
    #[case::kanji("日本語")]
    #[case::mixed_with_latin("OK ボタン")]
    #[case::single_char("あ")]
    fn test_japanese_accepts(#[case] text: &str) {
        assert!(ScriptFilter::japanese().matches(text));
    }

    #[rstest]
    #[case::latin("Hello")]
    #[case::digits("12345")]
    #[case::empty("")]
    #[case::whitespace("   \n\t")]
    #[case::hangul("안녕하세요")]
    #[case::ideographic_space("\u{3000}")]
    fn test_japanese_rejects(#[case] text: &str) {
        assert!(!ScriptFilter::japanese().matches(text));
    }

    #[test]
    fn test_korean_filter() {
        let filter = ScriptFilter::korean();
        assert!(filter.matches("안녕하세요"));
        assert!(!filter.matches("こんにちは"));
    }

    #[test]
    fn test_for_language_lookup() {
        assert_eq!(ScriptFilter::for_language("ja"), Some(ScriptFilter::japanese()));
        assert_eq!(ScriptFilter::for_language("KO"), Some(ScriptFilter::korean()));
        assert_eq!(ScriptFilter::for_language("zh"), Some(ScriptFilter::chinese()));
        assert_eq!(ScriptFilter::for_language("fr"), None);
    }

    #[test]
    fn test_usable_as_trait_object() {
        let filter: Box<dyn LanguageFilter> = Box::new(ScriptFilter::japanese());
        assert!(filter.matches("漢字"));
    }
}
