//! Property tests for the text-overlap heuristics.

use proptest::prelude::*;

use plotweave::services::matcher::{similarity, tokenize};

const CJK_TEXT: &str = "[林风青云宗秘境古剑血魔abc ，。]{0,60}";

proptest! {
    #[test]
    fn prop_similarity_bounded(a in CJK_TEXT, b in CJK_TEXT) {
        let score = similarity(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
    }

    #[test]
    fn prop_similarity_symmetric(a in CJK_TEXT, b in CJK_TEXT) {
        prop_assert_eq!(similarity(&a, &b).to_bits(), similarity(&b, &a).to_bits());
    }

    #[test]
    fn prop_identical_text_scores_one(a in CJK_TEXT) {
        prop_assume!(!tokenize(&a).is_empty());
        prop_assert_eq!(similarity(&a, &a), 1.0);
    }

    #[test]
    fn prop_contained_outline_scores_one(a in CJK_TEXT, b in CJK_TEXT) {
        prop_assume!(!tokenize(&a).is_empty());
        // An outline wholly contained in a longer text must score 1.0: that
        // containment is exactly the duplication the metric exists to catch.
        let combined = format!("{a}。{b}");
        prop_assert_eq!(similarity(&a, &combined), 1.0);
    }

    #[test]
    fn prop_disjoint_texts_score_zero(a in "[一二三四五 ]{4,30}", b in "[六七八九十 ]{4,30}") {
        prop_assert_eq!(similarity(&a, &b), 0.0);
    }
}
