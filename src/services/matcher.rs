//! Token similarity and tiered keyword matching for CJK outline text.

use std::collections::HashSet;

use crate::domain::models::HeuristicsConfig;
use crate::services::lexicon::Lexicon;

/// Sentence-level delimiters used when tokenizing free text.
const TOKEN_DELIMITERS: &[char] = &[
    '，', '。', '！', '？', '、', '；', '：', ',', '.', '!', '?', ';', ':',
];

/// Delimiters used when splitting an event description into keywords.
const KEYWORD_DELIMITERS: &[char] = &['，', '。', '、', ',', '.'];

fn is_token_delimiter(c: char) -> bool {
    c.is_whitespace() || TOKEN_DELIMITERS.contains(&c)
}

fn is_keyword_delimiter(c: char) -> bool {
    c.is_whitespace() || KEYWORD_DELIMITERS.contains(&c)
}

/// Split text into a set of tokens, dropping single-char fragments which
/// carry almost no signal in CJK prose.
pub fn tokenize(text: &str) -> HashSet<&str> {
    text.split(is_token_delimiter)
        .filter(|t| t.chars().count() > 1)
        .collect()
}

/// Split an event description into its keyword list, preserving order.
pub fn event_keywords(event: &str) -> Vec<&str> {
    event
        .split(is_keyword_delimiter)
        .filter(|t| t.chars().count() > 1)
        .collect()
}

/// Overlap similarity between two texts: |A ∩ B| / min(|A|, |B|).
///
/// Normalizing by the smaller set makes a short outline that is wholly
/// contained in a longer one score 1.0, which is the failure mode this
/// metric exists to catch. Returns 0.0 when either side has no tokens.
pub fn similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let shared = tokens_a.intersection(&tokens_b).count();
    shared as f64 / tokens_a.len().min(tokens_b.len()) as f64
}

/// Tiered keyword matcher for forbidden/completed event detection.
///
/// Short event descriptions must match completely; longer ones tolerate
/// partial matches but only when a core action word is among the hits, so a
/// pile of incidental name matches cannot trip the detector.
pub struct EventMatcher<'a> {
    config: &'a HeuristicsConfig,
    lexicon: &'a Lexicon,
}

impl<'a> EventMatcher<'a> {
    pub fn new(config: &'a HeuristicsConfig, lexicon: &'a Lexicon) -> Self {
        Self { config, lexicon }
    }

    /// Fraction of the event's keywords present in `content`, and whether
    /// any matched keyword is a core action word.
    fn match_profile(&self, content: &str, event: &str) -> (f64, bool) {
        let keywords = event_keywords(event);
        if keywords.is_empty() {
            return (0.0, false);
        }
        let mut matched = 0usize;
        let mut core_hit = false;
        for keyword in &keywords {
            if content.contains(keyword) {
                matched += 1;
                if self.lexicon.is_core_action(keyword) {
                    core_hit = true;
                }
            }
        }
        (matched as f64 / keywords.len() as f64, core_hit)
    }

    /// True if `content` appears to narrate `event`.
    pub fn event_occurs(&self, content: &str, event: &str) -> bool {
        let keyword_count = event_keywords(event).len();
        let (ratio, core_hit) = self.match_profile(content, event);
        match keyword_count {
            0 => false,
            1..=3 => ratio >= 1.0,
            4..=6 => ratio >= self.config.mid_tier_ratio && core_hit,
            _ => ratio >= self.config.long_tier_ratio && core_hit,
        }
    }

    /// First event from `events` that `content` appears to narrate.
    pub fn first_matching_event<'e>(
        &self,
        content: &str,
        events: &'e [String],
    ) -> Option<&'e str> {
        events
            .iter()
            .find(|event| self.event_occurs(content, event))
            .map(String::as_str)
    }

    /// Raw keyword coverage of `event` in `content`, tier rules aside.
    pub fn keyword_coverage(&self, content: &str, event: &str) -> f64 {
        self.match_profile(content, event).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher_fixture() -> (HeuristicsConfig, Lexicon) {
        (HeuristicsConfig::default(), Lexicon::default())
    }

    #[test]
    fn test_similarity_identical_short_texts() {
        assert_eq!(similarity("林风 突破 筑基", "林风 突破 筑基"), 1.0);
    }

    #[test]
    fn test_unpunctuated_texts_are_single_tokens() {
        // No delimiter inside either string, so each side is one token and
        // the intersection is empty despite the shared substring.
        assert_eq!(similarity("主角击败了血魔宗的长老", "主角大战血魔宗获胜"), 0.0);
    }

    #[test]
    fn test_similarity_empty_side_is_zero() {
        assert_eq!(similarity("", "林风突破筑基"), 0.0);
        assert_eq!(similarity("。！？", "林风 突破"), 0.0);
    }

    #[test]
    fn test_similarity_subset_scores_full() {
        // Short text fully contained in the longer one.
        let short = "林风，突破";
        let long = "林风，突破，大战黑袍老者，夺得古剑";
        assert_eq!(similarity(short, long), 1.0);
    }

    #[test]
    fn test_single_char_tokens_dropped() {
        let tokens = tokenize("风，林风，去了");
        assert!(tokens.contains("林风"));
        assert!(tokens.contains("去了"));
        assert!(!tokens.contains("风"));
    }

    #[test]
    fn test_short_event_requires_full_match() {
        let (config, lexicon) = matcher_fixture();
        let matcher = EventMatcher::new(&config, &lexicon);
        // Two keywords: both must appear.
        assert!(matcher.event_occurs("林风终于击败了血魔", "林风 击败 血魔"));
        assert!(!matcher.event_occurs("林风遇见了血魔", "林风 击败 血魔"));
    }

    #[test]
    fn test_mid_tier_needs_core_action_word() {
        let (config, lexicon) = matcher_fixture();
        let matcher = EventMatcher::new(&config, &lexicon);
        let event = "林风 青云宗 大比 击败 赵虎";
        // 4 of 5 keywords hit, including the core word 击败.
        assert!(matcher.event_occurs("林风在青云宗大比中击败对手", event));
        // Same ratio but the core word is missing from the content.
        assert!(!matcher.event_occurs("林风在青云宗大比中遇到赵虎", event));
    }

    #[test]
    fn test_first_match_wins() {
        let (config, lexicon) = matcher_fixture();
        let matcher = EventMatcher::new(&config, &lexicon);
        let events = vec![
            "林风 突破 筑基".to_string(),
            "林风 击败 血魔".to_string(),
        ];
        let content = "林风突破到筑基期，随后击败血魔";
        assert_eq!(
            matcher.first_matching_event(content, &events),
            Some("林风 突破 筑基")
        );
    }

    #[test]
    fn test_keyword_coverage() {
        let (config, lexicon) = matcher_fixture();
        let matcher = EventMatcher::new(&config, &lexicon);
        let coverage = matcher.keyword_coverage("林风露面了", "林风 击败 血魔 夺剑");
        assert!((coverage - 0.25).abs() < f64::EPSILON);
    }
}
