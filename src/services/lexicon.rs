//! Heuristic keyword tables.
//!
//! These lists are calibration data for the CJK heuristics, kept as data so
//! deployments can extend them without touching matching logic.

use serde::{Deserialize, Serialize};

/// Verbs that anchor a plot event. A keyword match on one of these carries
/// far more signal than a match on a name or a place.
pub const CORE_ACTION_WORDS: &[&str] = &[
    "击败", "战胜", "打败", "消灭", "杀死", "斩杀", "覆灭", "突破", "晋级", "进阶", "觉醒",
    "获得", "得到", "习得", "发现", "揭露", "揭开", "真相", "结盟", "联合", "背叛", "反目",
    "决裂", "逃离", "离开", "进入", "到达", "返回", "比赛", "大赛", "考核", "试炼", "挑战",
    "死亡", "牺牲", "陨落", "复活", "苏醒", "重生",
];

/// Weaker action words accepted when mining key events out of free text.
pub const EXTENDED_ACTION_WORDS: &[&str] = &["知道", "了解", "前往", "参加"];

/// Markers that make a mention of a dead character legitimate (flashback,
/// memory, explicit reference to the death).
pub const RETROSPECTIVE_MARKERS: &[&str] = &[
    "曾经", "当年", "想起", "回忆", "以前", "从前", "那时", "往事", "故去", "已故", "去世",
    "死后",
];

/// Phrases that signal an on-page death.
pub const DEATH_KEYWORDS: &[&str] = &[
    "死了", "死亡", "牺牲", "去世", "陨落", "身亡", "殒命", "断气", "咽气", "没了呼吸",
    "停止了呼吸", "闭上了眼睛", "倒在血泊", "永远地", "再也不会", "化为灰烬", "魂飞魄散",
    "灰飞烟灭", "香消玉殒", "与世长辞", "命丧", "丧命",
];

/// Topic words that mark a world-setting line as load-bearing.
pub const WORLD_SETTING_KEYWORDS: &[&str] = &[
    "等级", "境界", "修炼", "力量", "体系", "规则", "世界", "时代", "背景",
];

/// Runtime-overridable view of the keyword tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub core_action_words: Vec<String>,
    pub extended_action_words: Vec<String>,
    pub retrospective_markers: Vec<String>,
    pub death_keywords: Vec<String>,
    pub world_setting_keywords: Vec<String>,
}

impl Lexicon {
    /// All words accepted as event anchors when mining free text.
    pub fn action_words(&self) -> impl Iterator<Item = &str> {
        self.core_action_words
            .iter()
            .chain(self.extended_action_words.iter())
            .map(String::as_str)
    }

    pub fn is_core_action(&self, keyword: &str) -> bool {
        self.core_action_words
            .iter()
            .any(|w| keyword == w || keyword.contains(w.as_str()))
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        let to_vec = |words: &[&str]| words.iter().map(|w| (*w).to_string()).collect();
        Self {
            core_action_words: to_vec(CORE_ACTION_WORDS),
            extended_action_words: to_vec(EXTENDED_ACTION_WORDS),
            retrospective_markers: to_vec(RETROSPECTIVE_MARKERS),
            death_keywords: to_vec(DEATH_KEYWORDS),
            world_setting_keywords: to_vec(WORLD_SETTING_KEYWORDS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_action_detection() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_core_action("突破"));
        assert!(lexicon.is_core_action("突破瓶颈"));
        assert!(!lexicon.is_core_action("林风"));
    }

    #[test]
    fn test_action_words_include_extended() {
        let lexicon = Lexicon::default();
        let words: Vec<&str> = lexicon.action_words().collect();
        assert!(words.contains(&"击败"));
        assert!(words.contains(&"前往"));
    }
}
