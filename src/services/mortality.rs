//! Character mortality guard: keeps dead characters dead.
//!
//! All scanning is char-based rather than byte-based so context windows
//! never split a CJK codepoint.

use std::fmt::Write as _;

use crate::domain::models::Character;
use crate::services::lexicon::Lexicon;

/// Chars of context kept on each side of a flagged mention.
const CONTEXT_RADIUS: usize = 20;
/// Max distance in chars between a name and a death phrase for the pair to
/// count as a death signal.
const DEATH_PROXIMITY: usize = 50;
/// Max example contexts reported per violating character.
const MAX_CONTEXTS: usize = 3;
/// Max living characters listed in a briefing block.
const MAX_BRIEFING_CHARACTERS: usize = 8;

/// A deceased character mentioned outside a retrospective frame.
#[derive(Debug, Clone)]
pub struct MortalityViolation {
    pub name: String,
    pub death_chapter: Option<String>,
    /// Total non-exempt mentions found.
    pub occurrences: usize,
    /// Up to [`MAX_CONTEXTS`] example snippets.
    pub contexts: Vec<String>,
}

/// Confidence of a locally detected death.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathConfidence {
    Low,
    Medium,
    High,
}

/// A character name found near death phrasing.
#[derive(Debug, Clone)]
pub struct DeathSignal {
    pub name: String,
    pub keywords: Vec<String>,
    pub confidence: DeathConfidence,
}

pub fn deceased(characters: &[Character]) -> Vec<&Character> {
    characters.iter().filter(|c| c.is_deceased()).collect()
}

pub fn active(characters: &[Character]) -> Vec<&Character> {
    characters.iter().filter(|c| !c.is_deceased()).collect()
}

/// Hard-constraint prompt block listing characters forbidden to appear.
/// Empty string when nobody has died yet.
pub fn build_deceased_warning(characters: &[Character]) -> String {
    let dead = deceased(characters);
    if dead.is_empty() {
        return String::new();
    }
    let mut block = String::from("【🚨 已故角色名单 - 绝对禁止出场】\n");
    block.push_str("以下角色已经死亡，在后续章节中：\n");
    block.push_str("1. 不得作为在场人物出现\n");
    block.push_str("2. 不得有新的对话或动作\n");
    block.push_str("3. 不得被描写为活着的状态\n");
    block.push_str("4. 其他角色对其只能使用过去时态提及\n\n");
    for character in &dead {
        let died = character.death_chapter.as_deref().unwrap_or("未知章节");
        let _ = writeln!(block, "- {}（死于：{}）", character.name, died);
    }
    block.push_str("\n⚠️ 可以做的：回忆、闪回、他人转述、遗物遗言\n");
    block.push_str("❌ 禁止的：正面出场、新增对话、影响当前剧情\n");
    block
}

/// Character roster prompt block: living characters first (capped), then the
/// deceased marked as forbidden.
pub fn character_briefing(characters: &[Character]) -> String {
    let mut block = String::from("【角色档案】\n");
    let living = active(characters);
    if !living.is_empty() {
        block.push_str("▶ 存活角色\n");
        for character in living.iter().take(MAX_BRIEFING_CHARACTERS) {
            let _ = write!(block, "• {}（{}）", character.name, character.role.label());
            if !character.identity.is_empty() {
                let _ = write!(block, "：{}", character.identity);
            }
            let relations: Vec<String> = character
                .relationships
                .iter()
                .take(2)
                .map(|r| format!("{}:{}", r.target_name, r.relation))
                .collect();
            if !relations.is_empty() {
                let _ = write!(block, " [关系：{}]", relations.join("、"));
            }
            block.push('\n');
        }
    }
    let dead = deceased(characters);
    if !dead.is_empty() {
        block.push_str("▶ 已故角色（禁止出场）\n");
        for character in dead {
            let died = character.death_chapter.as_deref().unwrap_or("未知章节");
            let _ = writeln!(block, "• {}（死于：{}）", character.name, died);
        }
    }
    block
}

/// All char offsets where `needle` occurs in `haystack`.
fn char_occurrences(haystack: &[char], needle: &[char]) -> Vec<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return Vec::new();
    }
    (0..=haystack.len() - needle.len())
        .filter(|&i| &haystack[i..i + needle.len()] == needle)
        .collect()
}

fn window(haystack: &[char], start: usize, len: usize, radius: usize) -> String {
    let from = start.saturating_sub(radius);
    let to = (start + len + radius).min(haystack.len());
    haystack[from..to].iter().collect()
}

/// Scan chapter content for deceased characters appearing outside a
/// retrospective frame (memory, flashback, explicit reference to the death).
pub fn detect_violations(
    content: &str,
    characters: &[Character],
    lexicon: &Lexicon,
) -> Vec<MortalityViolation> {
    let chars: Vec<char> = content.chars().collect();
    let mut violations = Vec::new();

    for character in deceased(characters) {
        let name_chars: Vec<char> = character.name.chars().collect();
        let mut flagged: Vec<String> = Vec::new();
        for start in char_occurrences(&chars, &name_chars) {
            let context = window(&chars, start, name_chars.len(), CONTEXT_RADIUS);
            let retrospective = lexicon
                .retrospective_markers
                .iter()
                .any(|marker| context.contains(marker.as_str()));
            if !retrospective {
                flagged.push(format!("...{context}..."));
            }
        }
        if !flagged.is_empty() {
            let occurrences = flagged.len();
            flagged.truncate(MAX_CONTEXTS);
            violations.push(MortalityViolation {
                name: character.name.clone(),
                death_chapter: character.death_chapter.clone(),
                occurrences,
                contexts: flagged,
            });
        }
    }
    violations
}

/// Local death scan: names found near death phrasing, no model call.
pub fn quick_analyze_deaths(
    content: &str,
    names: &[String],
    lexicon: &Lexicon,
) -> Vec<DeathSignal> {
    let chars: Vec<char> = content.chars().collect();
    let mut signals = Vec::new();

    for name in names {
        let name_chars: Vec<char> = name.chars().collect();
        let mut matched: Vec<String> = Vec::new();
        for start in char_occurrences(&chars, &name_chars) {
            let vicinity = window(&chars, start, name_chars.len(), DEATH_PROXIMITY);
            for keyword in &lexicon.death_keywords {
                if vicinity.contains(keyword.as_str()) && !matched.contains(keyword) {
                    matched.push(keyword.clone());
                }
            }
        }
        if matched.is_empty() {
            continue;
        }
        let confidence = match matched.len() {
            0 => unreachable!(),
            1 => DeathConfidence::Low,
            2 => DeathConfidence::Medium,
            _ => DeathConfidence::High,
        };
        signals.push(DeathSignal {
            name: name.clone(),
            keywords: matched,
            confidence,
        });
    }
    signals
}

/// User-facing rendering of violation findings.
pub fn format_violations(violations: &[MortalityViolation]) -> String {
    if violations.is_empty() {
        return String::new();
    }
    let mut out = String::from("⚠️ 检测到已故角色出场：\n");
    for violation in violations {
        let died = violation.death_chapter.as_deref().unwrap_or("未知章节");
        let _ = writeln!(
            out,
            "- {}（死于：{}，共出现{}次）",
            violation.name, died, violation.occurrences
        );
        for context in &violation.contexts {
            let _ = writeln!(out, "  {context}");
        }
    }
    out
}

/// Prompt asking the author to confirm a locally detected death before the
/// character sheet is updated.
pub fn death_confirmation_prompt(signal: &DeathSignal, chapter_title: &str) -> String {
    format!(
        "在《{}》中检测到角色\"{}\"疑似死亡（依据：{}）。确认后该角色将标记为已故，后续章节禁止出场。",
        chapter_title,
        signal.name,
        signal.keywords.join("、")
    )
}
