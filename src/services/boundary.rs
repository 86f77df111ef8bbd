//! Volume boundary derivation and outline validation.
//!
//! A volume boundary is the contract a batch of generated chapter outlines
//! must respect: finish this volume's events, repeat nothing the previous
//! volume already completed, and leak nothing from the next one.

use std::fmt::Write as _;

use crate::domain::models::{HeuristicsConfig, Volume};
use crate::services::lexicon::Lexicon;
use crate::services::matcher::{similarity, EventMatcher};

/// The narrative contract for one volume.
#[derive(Debug, Clone)]
pub struct VolumeBoundary {
    pub volume_index: usize,
    pub volume_title: String,
    /// Events this volume must complete.
    pub must_complete_events: Vec<String>,
    /// Events reserved for the next volume.
    pub forbidden_events: Vec<String>,
    /// Events the previous volume already completed.
    pub completed_events: Vec<String>,
    pub starting_state: String,
    pub ending_state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryErrorKind {
    /// Repeats something the previous volume already did.
    PastRepeat,
    /// Narrates something reserved for the next volume.
    FutureLeak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Medium,
    High,
}

/// A hard boundary violation in one generated outline.
#[derive(Debug, Clone)]
pub struct BoundaryError {
    /// 1-based chapter number inside the generated batch.
    pub chapter_number: usize,
    pub kind: BoundaryErrorKind,
    pub severity: Severity,
    pub description: String,
    pub conflict_source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryWarningKind {
    /// Noticeable but tolerable overlap with earlier material.
    SimilarContent,
    /// A must-complete event looks unfulfilled by the batch.
    PotentialOverlap,
}

#[derive(Debug, Clone)]
pub struct BoundaryWarning {
    /// 1-based chapter number; 0 for batch-level warnings.
    pub chapter_number: usize,
    pub kind: BoundaryWarningKind,
    pub description: String,
}

/// Validation outcome. `is_valid` means no high-severity errors; warnings
/// and medium errors are advisory.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<BoundaryError>,
    pub warnings: Vec<BoundaryWarning>,
}

/// A chapter outline under validation: either freshly generated or already
/// on the books.
#[derive(Debug, Clone)]
pub struct ChapterDraft {
    /// 1-based position inside its volume.
    pub number: usize,
    pub title: String,
    pub outline: String,
}

impl ChapterDraft {
    fn full_text(&self) -> String {
        format!("{} {}", self.title, self.outline)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_unique(events: &mut Vec<String>, candidate: &str) {
    if !events.iter().any(|e| e == candidate) {
        events.push(candidate.to_string());
    }
}

/// Mine key events out of a volume summary.
///
/// Explicit `key_events` come first, then clauses of the main plot (5 to 50
/// chars), topped up from action-anchored summary clauses (4 to 40 chars)
/// when fewer than three were collected so far. Deduplicated preserving
/// order, at most five results.
pub fn extract_key_events(
    summary: &str,
    key_events: &[String],
    main_plot: Option<&str>,
    lexicon: &Lexicon,
) -> Vec<String> {
    let mut events: Vec<String> = Vec::new();

    for event in key_events {
        push_unique(&mut events, event);
    }

    if let Some(main_plot) = main_plot {
        for clause in main_plot.split(['。', '；', ';']) {
            let clause = clause.trim();
            let len = char_len(clause);
            if len > 5 && len < 50 {
                push_unique(&mut events, clause);
            }
        }
    }

    if events.len() < 3 {
        for clause in summary.split(['，', '。', '！', '？', '、', '；']) {
            let clause = clause.trim();
            let len = char_len(clause);
            if len >= 4 && len < 40 && lexicon.action_words().any(|w| clause.contains(w)) {
                push_unique(&mut events, clause);
            }
        }
    }

    events.truncate(5);
    events
}

fn volume_events(volume: &Volume, lexicon: &Lexicon) -> Vec<String> {
    if !volume.key_events.is_empty() {
        volume.key_events.clone()
    } else if !volume.key_points.is_empty() {
        volume.key_points.clone()
    } else {
        extract_key_events(
            &volume.summary,
            &[],
            volume.main_plot.as_deref(),
            lexicon,
        )
    }
}

/// Derive the boundary for `current` from its neighbors.
pub fn build_volume_boundary(
    current: &Volume,
    volume_index: usize,
    previous: Option<&Volume>,
    next: Option<&Volume>,
    lexicon: &Lexicon,
) -> VolumeBoundary {
    VolumeBoundary {
        volume_index,
        volume_title: current.title.clone(),
        must_complete_events: volume_events(current, lexicon),
        completed_events: previous.map(|v| volume_events(v, lexicon)).unwrap_or_default(),
        forbidden_events: next.map(|v| volume_events(v, lexicon)).unwrap_or_default(),
        starting_state: previous.map_or_else(
            || "故事开端".to_string(),
            |v| format!("承接《{}》结尾", v.title),
        ),
        ending_state: next.map_or_else(
            || "本卷为最终卷".to_string(),
            |v| format!("为《{}》做铺垫", v.title),
        ),
    }
}

/// Validate a batch of generated outlines against the boundary.
///
/// `existing` is same-volume chapters already written; `previous_chapters`
/// is the full previous volume, used for similarity screening.
pub fn validate(
    generated: &[ChapterDraft],
    boundary: &VolumeBoundary,
    existing: &[ChapterDraft],
    previous_chapters: &[ChapterDraft],
    config: &HeuristicsConfig,
    lexicon: &Lexicon,
) -> ValidationResult {
    let matcher = EventMatcher::new(config, lexicon);
    let mut result = ValidationResult::default();

    for draft in generated {
        let full = draft.full_text();

        if let Some(event) = matcher.first_matching_event(&full, &boundary.completed_events) {
            result.errors.push(BoundaryError {
                chapter_number: draft.number,
                kind: BoundaryErrorKind::PastRepeat,
                severity: Severity::High,
                description: format!("第{}章疑似重复上一卷已完成的事件", draft.number),
                conflict_source: Some(event.to_string()),
            });
        }

        if let Some(event) = matcher.first_matching_event(&full, &boundary.forbidden_events) {
            result.errors.push(BoundaryError {
                chapter_number: draft.number,
                kind: BoundaryErrorKind::FutureLeak,
                severity: Severity::High,
                description: format!("第{}章疑似提前写了下一卷的内容", draft.number),
                conflict_source: Some(event.to_string()),
            });
        }

        for previous in previous_chapters {
            let score = similarity(&full, &previous.full_text());
            if score > config.similarity_error {
                result.errors.push(BoundaryError {
                    chapter_number: draft.number,
                    kind: BoundaryErrorKind::PastRepeat,
                    severity: Severity::High,
                    description: format!(
                        "第{}章与上一卷《{}》相似度{}%，疑似重复",
                        draft.number,
                        previous.title,
                        (score * 100.0).round()
                    ),
                    conflict_source: Some(previous.title.clone()),
                });
            } else if score >= config.similarity_warn {
                result.warnings.push(BoundaryWarning {
                    chapter_number: draft.number,
                    kind: BoundaryWarningKind::SimilarContent,
                    description: format!(
                        "第{}章与上一卷《{}》相似度{}%，请确认是否有意呼应",
                        draft.number,
                        previous.title,
                        (score * 100.0).round()
                    ),
                });
            }
        }

        for sibling in existing {
            let score = similarity(&full, &sibling.full_text());
            if score > config.similarity_error {
                result.errors.push(BoundaryError {
                    chapter_number: draft.number,
                    kind: BoundaryErrorKind::PastRepeat,
                    severity: Severity::Medium,
                    description: format!(
                        "第{}章与本卷已有章节《{}》高度相似",
                        draft.number, sibling.title
                    ),
                    conflict_source: Some(sibling.title.clone()),
                });
            }
        }
    }

    let batch_text: String = generated
        .iter()
        .map(ChapterDraft::full_text)
        .collect::<Vec<_>>()
        .join("\n");
    for event in &boundary.must_complete_events {
        if matcher.keyword_coverage(&batch_text, event) < config.must_complete_coverage {
            result.warnings.push(BoundaryWarning {
                chapter_number: 0,
                kind: BoundaryWarningKind::PotentialOverlap,
                description: format!("本卷可能未完成关键事件：{event}"),
            });
        }
    }

    result.is_valid = !result
        .errors
        .iter()
        .any(|e| e.severity == Severity::High);
    result
}

/// Bordered hard-constraint prompt block injected ahead of generation.
pub fn build_constraint_prompt(boundary: &VolumeBoundary) -> String {
    let mut block = String::new();
    block.push_str("╔══════════════════════════════════╗\n");
    block.push_str("【🚨 内容边界强制约束】\n");
    block.push_str("╚══════════════════════════════════╝\n\n");

    if !boundary.completed_events.is_empty() {
        block.push_str("🔴【禁区一：过去已完成】以下事件已经发生，绝对不可重写：\n");
        for event in &boundary.completed_events {
            let _ = writeln!(block, "❌ {event}");
        }
        block.push('\n');
    }
    if !boundary.forbidden_events.is_empty() {
        block.push_str("🔴【禁区二：未来不可触碰】以下事件属于下一卷，绝对不可提前：\n");
        for event in &boundary.forbidden_events {
            let _ = writeln!(block, "⛔ {event}");
        }
        block.push('\n');
    }
    if !boundary.must_complete_events.is_empty() {
        block.push_str("🟢【本卷核心任务】以下事件必须在本卷内完成：\n");
        for event in &boundary.must_complete_events {
            let _ = writeln!(block, "✅ {event}");
        }
        block.push('\n');
    }
    let _ = writeln!(block, "📍【起始状态】{}", boundary.starting_state);
    let _ = writeln!(block, "🎯【目标状态】{}", boundary.ending_state);
    block.push_str("\n⚠️ 任何违反上述边界的内容都会破坏全书结构，必须严格遵守。\n");
    block
}

/// User-facing rendering of a validation result.
pub fn format_validation_result(result: &ValidationResult) -> String {
    let mut out = String::new();
    if result.is_valid {
        out.push_str("✅ 边界校验通过\n");
    } else {
        out.push_str("❌ 边界校验未通过\n");
    }
    for error in &result.errors {
        let _ = writeln!(out, "❌ {}", error.description);
        if let Some(source) = &error.conflict_source {
            let _ = writeln!(out, "   冲突来源：{source}");
        }
    }
    for warning in &result.warnings {
        let _ = writeln!(out, "⚠️ {}", warning.description);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn fixture() -> (HeuristicsConfig, Lexicon) {
        (HeuristicsConfig::default(), Lexicon::default())
    }

    fn draft(number: usize, title: &str, outline: &str) -> ChapterDraft {
        ChapterDraft {
            number,
            title: title.to_string(),
            outline: outline.to_string(),
        }
    }

    fn boundary_fixture() -> VolumeBoundary {
        VolumeBoundary {
            volume_index: 1,
            volume_title: "秘境风云".to_string(),
            must_complete_events: vec!["林风 获得 古剑".to_string()],
            forbidden_events: vec!["林风 击败 血魔".to_string()],
            completed_events: vec!["林风 拜入 青云宗".to_string()],
            starting_state: "承接《初入宗门》结尾".to_string(),
            ending_state: "为《血魔之乱》做铺垫".to_string(),
        }
    }

    #[test]
    fn test_explicit_key_events_come_first() {
        let lexicon = Lexicon::default();
        let events = extract_key_events(
            "林风拜入青云宗，击败赵虎。",
            &["钦定事件".to_string()],
            None,
            &lexicon,
        );
        assert_eq!(events[0], "钦定事件");
        // Explicit events do not suppress mining from the summary.
        assert!(events.iter().any(|e| e == "击败赵虎"));
    }

    #[test]
    fn test_explicit_key_events_capped_at_five() {
        let lexicon = Lexicon::default();
        let many: Vec<String> = (1..=7).map(|i| format!("事件{i}")).collect();
        let events = extract_key_events("", &many, None, &lexicon);
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], "事件1");
        assert_eq!(events[4], "事件5");
    }

    #[test]
    fn test_nonadjacent_duplicates_removed() {
        let lexicon = Lexicon::default();
        let main_plot = "林风击败血魔宗长老。林风进入秘境探险";
        let summary = "林风击败血魔宗长老，随后远走他乡。";
        let events = extract_key_events(summary, &[], Some(main_plot), &lexicon);
        assert_eq!(
            events
                .iter()
                .filter(|e| *e == "林风击败血魔宗长老")
                .count(),
            1
        );
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_main_plot_clauses_mined() {
        let lexicon = Lexicon::default();
        let main_plot = "林风进入上古秘境寻找机缘。短句。林风获得古剑认主，实力大增；伏笔若干";
        let events = extract_key_events("", &[], Some(main_plot), &lexicon);
        assert!(events.iter().any(|e| e.contains("上古秘境")));
        assert!(events.iter().any(|e| e.contains("古剑认主")));
        // "短句。" is too short to qualify.
        assert!(!events.iter().any(|e| e == "短句"));
        assert!(events.len() <= 5);
    }

    #[test]
    fn test_summary_mining_tops_up() {
        let lexicon = Lexicon::default();
        let summary = "林风前往青云山拜师学艺，其间击败了挑衅的赵虎，最终获得长老赏识。";
        let events = extract_key_events(summary, &[], None, &lexicon);
        assert!(events.iter().any(|e| e.contains("击败")));
        assert!(events.len() <= 5);
    }

    #[test]
    fn test_boundary_edges() {
        let lexicon = Lexicon::default();
        let project_id = Uuid::new_v4();
        let only = Volume::new(project_id, "孤卷", 0).with_key_events(vec!["事件".to_string()]);
        let boundary = build_volume_boundary(&only, 0, None, None, &lexicon);
        assert_eq!(boundary.starting_state, "故事开端");
        assert_eq!(boundary.ending_state, "本卷为最终卷");
        assert!(boundary.completed_events.is_empty());
        assert!(boundary.forbidden_events.is_empty());
    }

    #[test]
    fn test_past_repeat_detected() {
        let (config, lexicon) = fixture();
        let boundary = boundary_fixture();
        let generated = vec![draft(1, "第一章", "林风回忆自己拜入青云宗的经过并获得古剑")];
        let result = validate(&generated, &boundary, &[], &[], &config, &lexicon);
        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == BoundaryErrorKind::PastRepeat && e.severity == Severity::High));
    }

    #[test]
    fn test_future_leak_detected() {
        let (config, lexicon) = fixture();
        let boundary = boundary_fixture();
        let generated = vec![draft(1, "决战", "林风终于击败了血魔，同时获得古剑")];
        let result = validate(&generated, &boundary, &[], &[], &config, &lexicon);
        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == BoundaryErrorKind::FutureLeak));
    }

    #[test]
    fn test_similarity_tiers() {
        let (config, lexicon) = fixture();
        let mut boundary = boundary_fixture();
        boundary.completed_events.clear();
        boundary.must_complete_events.clear();

        let prev = vec![draft(1, "旧章", "林风 秘境 夺宝 古剑 认主 突破")];
        // Near-identical outline: high similarity error.
        let generated = vec![draft(1, "新章", "林风 秘境 夺宝 古剑 认主 突破")];
        let result = validate(&generated, &boundary, &[], &prev, &config, &lexicon);
        assert!(result
            .errors
            .iter()
            .any(|e| e.severity == Severity::High && e.description.contains("相似度")));

        // Partial overlap: warning only.
        let generated = vec![draft(1, "新章", "林风 秘境 夺宝 古剑 脱困 归来")];
        let result = validate(&generated, &boundary, &[], &prev, &config, &lexicon);
        assert!(result.is_valid);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.kind == BoundaryWarningKind::SimilarContent));
    }

    #[test]
    fn test_must_complete_coverage_warning() {
        let (config, lexicon) = fixture();
        let boundary = boundary_fixture();
        let generated = vec![draft(1, "第一章", "主角在集市闲逛，偶遇故人。")];
        let result = validate(&generated, &boundary, &[], &[], &config, &lexicon);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.kind == BoundaryWarningKind::PotentialOverlap
                && w.chapter_number == 0
                && w.description.contains("古剑")));
    }

    #[test]
    fn test_clean_batch_is_valid() {
        let (config, lexicon) = fixture();
        let boundary = boundary_fixture();
        let generated = vec![draft(1, "第一章", "林风深入秘境，历经艰险获得古剑认主。")];
        let result = validate(&generated, &boundary, &[], &[], &config, &lexicon);
        assert!(result.is_valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_constraint_prompt_sections() {
        let prompt = build_constraint_prompt(&boundary_fixture());
        assert!(prompt.contains("【🚨 内容边界强制约束】"));
        assert!(prompt.contains("禁区一"));
        assert!(prompt.contains("❌ 林风 拜入 青云宗"));
        assert!(prompt.contains("⛔ 林风 击败 血魔"));
        assert!(prompt.contains("✅ 林风 获得 古剑"));
        assert!(prompt.contains("📍【起始状态】承接《初入宗门》结尾"));
    }
}
