//! Plot thread pacing heuristics: overdue payoffs, imminent deadlines,
//! neglected setups, and per-chapter resolution suggestions.

use std::fmt::Write as _;
use uuid::Uuid;

use crate::domain::models::{HeuristicsConfig, Importance, PlotThread, ThreadStatus};

/// Kind of pacing problem found for a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingIssue {
    /// The expected resolution window has passed.
    Overdue,
    /// Inside the window with only a few chapters left.
    Imminent,
    /// Critical thread with zero hints long after planting.
    Neglected,
}

/// Advisory pacing warning. Never blocks anything.
#[derive(Debug, Clone)]
pub struct PacingWarning {
    pub thread_id: Uuid,
    pub issue: PacingIssue,
    pub description: String,
    pub suggestion: String,
}

/// Buckets of suggested actions for the chapter being written. Membership
/// is decided in priority order and is mutually exclusive.
#[derive(Debug, Default)]
pub struct ResolutionSuggestions<'a> {
    /// Window is closing or closed: resolve now.
    pub must_resolve: Vec<&'a PlotThread>,
    /// In window, far from the deadline, not hinted recently: drop a hint.
    pub should_hint: Vec<&'a PlotThread>,
    /// In window with room to spare: resolving is an option.
    pub can_resolve: Vec<&'a PlotThread>,
}

/// Check all open threads against the chapter about to be written.
pub fn check_consistency(
    chapter_index: usize,
    threads: &[PlotThread],
    config: &HeuristicsConfig,
) -> Vec<PacingWarning> {
    let mut warnings = Vec::new();
    for thread in threads.iter().filter(|t| t.status.is_open()) {
        let range = thread.expected_resolution;
        if chapter_index > range.max {
            warnings.push(PacingWarning {
                thread_id: thread.id,
                issue: PacingIssue::Overdue,
                description: format!(
                    "伏笔\"{}\"已超过预期揭晓范围（第{}-{}章）",
                    thread.description,
                    range.min + 1,
                    range.max + 1
                ),
                suggestion: "建议尽快揭晓该伏笔，或将其标记为放弃".to_string(),
            });
        } else if range.contains(chapter_index)
            && range.max - chapter_index <= config.imminent_window
        {
            warnings.push(PacingWarning {
                thread_id: thread.id,
                issue: PacingIssue::Imminent,
                description: format!(
                    "伏笔\"{}\"即将到达揭晓期限（第{}章前）",
                    thread.description,
                    range.max + 1
                ),
                suggestion: "建议在近期章节安排揭晓".to_string(),
            });
        }
        if thread.importance == Importance::Critical
            && thread.hints.is_empty()
            && chapter_index > thread.planted_chapter + config.neglect_gap
        {
            warnings.push(PacingWarning {
                thread_id: thread.id,
                issue: PacingIssue::Neglected,
                description: format!(
                    "关键伏笔\"{}\"埋设于第{}章，至今没有任何暗示",
                    thread.description,
                    thread.planted_chapter + 1
                ),
                suggestion: "建议添加暗示，避免读者遗忘".to_string(),
            });
        }
    }
    warnings
}

/// Sort open threads into action buckets for the chapter being written.
pub fn resolution_suggestions<'a>(
    chapter_index: usize,
    threads: &'a [PlotThread],
    config: &HeuristicsConfig,
) -> ResolutionSuggestions<'a> {
    let mut suggestions = ResolutionSuggestions::default();
    for thread in threads.iter().filter(|t| t.status.is_open()) {
        let range = thread.expected_resolution;
        if chapter_index + config.must_resolve_margin >= range.max {
            suggestions.must_resolve.push(thread);
        } else if chapter_index >= range.min
            && chapter_index + config.should_hint_margin < range.max
            && !thread.hinted_within(chapter_index, config.hint_recency_window)
        {
            suggestions.should_hint.push(thread);
        } else if range.contains(chapter_index) {
            suggestions.can_resolve.push(thread);
        }
    }
    suggestions
}

/// Prompt block reminding the drafting model which threads need attention.
/// Empty string when nothing needs attention.
pub fn plot_reminder(suggestions: &ResolutionSuggestions<'_>) -> String {
    if suggestions.must_resolve.is_empty()
        && suggestions.should_hint.is_empty()
        && suggestions.can_resolve.is_empty()
    {
        return String::new();
    }
    let mut block = String::new();
    if !suggestions.must_resolve.is_empty() {
        block.push_str("【必须揭晓的伏笔】\n");
        for thread in &suggestions.must_resolve {
            let _ = writeln!(
                block,
                "- {}（埋设于第{}章，已超期）",
                thread.description,
                thread.planted_chapter + 1
            );
        }
    }
    if !suggestions.should_hint.is_empty() {
        block.push_str("【建议添加暗示的伏笔】\n");
        for thread in &suggestions.should_hint {
            let _ = writeln!(
                block,
                "- {}（预期在第{}-{}章揭晓）",
                thread.description,
                thread.expected_resolution.min + 1,
                thread.expected_resolution.max + 1
            );
        }
    }
    if !suggestions.can_resolve.is_empty() {
        block.push_str("【可选揭晓的伏笔】\n");
        for thread in &suggestions.can_resolve {
            let _ = writeln!(block, "- {}", thread.description);
        }
    }
    block
}

/// Markdown tracking report over all threads.
pub fn plot_report(threads: &[PlotThread]) -> String {
    let mut report = String::from("# 伏笔追踪报告\n\n");

    let count = |status: ThreadStatus| threads.iter().filter(|t| t.status == status).count();
    let _ = writeln!(
        report,
        "共{}条伏笔：进行中 {}，已暗示 {}，已揭晓 {}，已放弃 {}\n",
        threads.len(),
        count(ThreadStatus::Active),
        count(ThreadStatus::Hinted),
        count(ThreadStatus::Resolved),
        count(ThreadStatus::Abandoned),
    );

    let open_critical: Vec<&PlotThread> = threads
        .iter()
        .filter(|t| t.status.is_open() && t.importance == Importance::Critical)
        .collect();
    if !open_critical.is_empty() {
        report.push_str("## 未揭晓的关键伏笔\n\n");
        for thread in open_critical {
            let _ = writeln!(
                report,
                "- {}（埋设于第{}章，预期第{}-{}章揭晓）",
                thread.description,
                thread.planted_chapter + 1,
                thread.expected_resolution.min + 1,
                thread.expected_resolution.max + 1
            );
        }
        report.push('\n');
    }

    report.push_str("## 全部伏笔\n\n");
    for thread in threads {
        let _ = writeln!(
            report,
            "- [{}|{}] {}（第{}章埋设，暗示{}次{}）",
            thread.importance.label(),
            match thread.status {
                ThreadStatus::Active => "进行中",
                ThreadStatus::Hinted => "已暗示",
                ThreadStatus::Resolved => "已揭晓",
                ThreadStatus::Abandoned => "已放弃",
            },
            thread.description,
            thread.planted_chapter + 1,
            thread.hints.len(),
            thread
                .resolved_chapter
                .map(|c| format!("，第{}章揭晓", c + 1))
                .unwrap_or_default(),
        );
    }
    report
}
