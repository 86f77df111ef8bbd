//! Drafting prompts and generation calls: outline, character sheets,
//! chapter prose, polish, summaries, and title brainstorming.
//!
//! Prompt assembly is pure and separately testable; the async wrappers just
//! send the assembled prompt through the text port.

use anyhow::Result;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::instrument;

use crate::domain::models::{decode_lenient, EmotionAdvice, Project, Scale, TitleSuggestions};
use crate::domain::ports::{GenerationRequest, TextGenerator, TextStream};
use crate::services::compressor::CompressedContext;

/// Chars of the previous chapter tail carried into a drafting prompt.
const PREVIOUS_TAIL_BUDGET: usize = 500;

fn scale_brief(scale: Scale) -> &'static str {
    match scale {
        Scale::Micro => "微型网文：总计3-5万字，15-25章，节奏紧凑，单卷完结",
        Scale::Million => "百万字长篇：300章以上，多卷结构，每卷围绕一条主线推进",
    }
}

fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(max)).collect()
}

/// Everything the chapter prompt needs, preassembled by the caller.
/// Constraint blocks are passed as rendered text and may be empty.
pub struct ChapterPromptInput<'a> {
    pub project: &'a Project,
    pub chapter_title: &'a str,
    pub chapter_outline: &'a str,
    /// Tail of the previous chapter's prose, for continuity.
    pub previous_content: &'a str,
    pub context: &'a CompressedContext,
    pub deceased_warning: &'a str,
    pub plot_reminder: &'a str,
    pub boundary_constraint: &'a str,
    pub emotion_advice: Option<&'a EmotionAdvice>,
}

/// Build the whole-book outline prompt.
pub fn outline_prompt(project: &Project) -> String {
    let mut prompt = String::from(
        "你是一位资深网文主编，擅长规划爆款长篇结构，深谙黄金三章留住读者的法则。\n\n",
    );
    let _ = writeln!(prompt, "【作品规模】{}", scale_brief(project.scale));
    if !project.genres.is_empty() {
        let _ = writeln!(prompt, "【题材】{}", project.genres.join("、"));
    }
    if !project.styles.is_empty() {
        let _ = writeln!(prompt, "【风格】{}", project.styles.join("、"));
    }
    if !project.inspiration.is_empty() {
        let _ = writeln!(prompt, "【灵感】{}", project.inspiration);
    }
    if !project.constraints.is_empty() {
        let _ = writeln!(prompt, "【硬性要求】{}", project.constraints);
    }
    if !project.world_setting.is_empty() {
        let _ = writeln!(prompt, "【世界观】{}", project.world_setting);
    }
    prompt.push_str(
        "\n请给出完整大纲：书名建议、一句话卖点、分卷规划（每卷主线与关键事件）、\
         前三章逐章细纲（必须在第三章前完成至少一次爽点兑现）。",
    );
    prompt
}

/// Build a character sheet prompt. `brief` is the author's one-line ask,
/// e.g. "一个亦正亦邪的师姐".
pub fn character_prompt(project: &Project, brief: &str) -> String {
    let mut prompt = format!(
        "为小说《{}》设计一个角色。\n\n【作品题材】{}\n【角色要求】{brief}\n",
        project.title,
        project.genres.join("、"),
    );
    if !project.world_setting.is_empty() {
        let _ = writeln!(prompt, "【世界观】{}", project.world_setting);
    }
    prompt.push_str(
        "\n请输出：姓名、性别、年龄、身份、性格与外貌描写、成长弧线、与主角的初始关系。",
    );
    prompt
}

/// Build the chapter prose prompt: constraint blocks first (hard rules
/// before creative instructions), then compressed context, then the task.
pub fn chapter_prompt(input: &ChapterPromptInput<'_>) -> String {
    let mut prompt = String::new();

    for block in [
        input.boundary_constraint,
        input.deceased_warning,
        input.plot_reminder,
    ] {
        if !block.is_empty() {
            prompt.push_str(block);
            prompt.push('\n');
        }
    }

    let _ = writeln!(prompt, "【作品】《{}》", input.project.title);
    let context = input.context;
    if !context.world_setting.is_empty() {
        let _ = writeln!(prompt, "【世界观】{}", context.world_setting);
    }
    if !context.characters.is_empty() {
        let _ = writeln!(prompt, "【主要角色】{}", context.characters);
    }
    if !context.volume_index.is_empty() {
        let _ = writeln!(prompt, "【分卷脉络】\n{}", context.volume_index);
    }
    if !context.previous_volume_key_points.is_empty() {
        let _ = writeln!(prompt, "【上卷回顾】{}", context.previous_volume_key_points);
    }
    if !context.next_volume_key_points.is_empty() {
        let _ = writeln!(prompt, "【下卷铺垫】{}", context.next_volume_key_points);
    }
    if !input.previous_content.is_empty() {
        let _ = writeln!(
            prompt,
            "【上一章结尾】\n{}",
            tail_chars(input.previous_content, PREVIOUS_TAIL_BUDGET)
        );
    }
    if let Some(advice) = input.emotion_advice {
        let _ = writeln!(
            prompt,
            "【情绪节奏】{}（目标强度{}，目标紧张度{}）",
            advice.reason, advice.target_intensity, advice.target_tension
        );
    }

    let _ = writeln!(
        prompt,
        "\n请撰写章节《{}》的正文。\n【本章细纲】{}",
        input.chapter_title, input.chapter_outline
    );
    prompt.push_str(
        "要求：2000-3000字；只输出正文，不要任何解释或标题；\
         以场景和对话推进，结尾留钩子。",
    );
    prompt
}

pub fn polish_prompt(content: &str, instruction: &str) -> String {
    format!(
        "请按以下要求润色这段小说正文，保持情节与人物不变，只输出润色后的正文。\n\n\
         【润色要求】{instruction}\n\n【原文】\n{content}"
    )
}

pub fn summary_prompt(content: &str) -> String {
    format!(
        "请将以下章节正文压缩成200字以内的剧情摘要，只保留影响后续情节的事实，\
         只输出摘要。\n\n【正文】\n{content}"
    )
}

pub fn continue_prompt(existing: &str, outline: &str) -> String {
    format!(
        "请顺着以下正文继续写，保持文风一致，只输出续写部分。\n\n\
         【已有正文结尾】\n{}\n\n【后续细纲】{outline}",
        tail_chars(existing, PREVIOUS_TAIL_BUDGET)
    )
}

pub fn title_prompt(project: &Project) -> String {
    format!(
        "请为一部{}小说起5个书名。\n【灵感】{}\n【简介】{}\n\n\
         只输出JSON，格式：{{\"titles\":[\"\",\"\"]}}",
        project.genres.join("、"),
        project.inspiration,
        project.summary,
    )
}

/// Drafting calls over the generative text port.
pub struct DraftingService {
    generator: Arc<dyn TextGenerator>,
}

impl DraftingService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    #[instrument(skip_all, fields(project = %project.title))]
    pub async fn generate_outline(&self, project: &Project) -> Result<String> {
        self.generator
            .generate(GenerationRequest::new(outline_prompt(project)))
            .await
    }

    #[instrument(skip_all)]
    pub async fn generate_character_sheet(&self, project: &Project, brief: &str) -> Result<String> {
        self.generator
            .generate(GenerationRequest::new(character_prompt(project, brief)))
            .await
    }

    #[instrument(skip_all, fields(chapter = %input.chapter_title))]
    pub async fn generate_chapter(&self, input: &ChapterPromptInput<'_>) -> Result<String> {
        self.generator
            .generate(GenerationRequest::new(chapter_prompt(input)))
            .await
    }

    /// Streaming variant of [`generate_chapter`](Self::generate_chapter) for
    /// live display while prose arrives.
    #[instrument(skip_all, fields(chapter = %input.chapter_title))]
    pub async fn stream_chapter(&self, input: &ChapterPromptInput<'_>) -> Result<TextStream> {
        self.generator
            .generate_stream(GenerationRequest::new(chapter_prompt(input)))
            .await
    }

    pub async fn polish(&self, content: &str, instruction: &str) -> Result<String> {
        self.generator
            .generate(GenerationRequest::new(polish_prompt(content, instruction)))
            .await
    }

    pub async fn summarize(&self, content: &str) -> Result<String> {
        self.generator
            .generate(GenerationRequest::new(summary_prompt(content)))
            .await
    }

    pub async fn continue_writing(&self, existing: &str, outline: &str) -> Result<String> {
        self.generator
            .generate(GenerationRequest::new(continue_prompt(existing, outline)))
            .await
    }

    /// Brainstorm book titles. Malformed model output yields an empty list.
    pub async fn generate_book_titles(&self, project: &Project) -> Result<Vec<String>> {
        let raw = self
            .generator
            .generate(GenerationRequest::new(title_prompt(project)))
            .await?;
        let suggestions: TitleSuggestions = decode_lenient(&raw);
        Ok(suggestions.titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        let mut p = Project::new("凡人问剑")
            .with_scale(Scale::Million)
            .with_world_setting("修炼体系分为炼气、筑基、金丹。");
        p.genres = vec!["玄幻".to_string()];
        p.inspiration = "一个不能修炼的少年捡到一柄会说话的剑".to_string();
        p
    }

    #[test]
    fn test_outline_prompt_mentions_scale_and_genre() {
        let prompt = outline_prompt(&project());
        assert!(prompt.contains("百万字长篇"));
        assert!(prompt.contains("玄幻"));
        assert!(prompt.contains("黄金三章"));
    }

    #[test]
    fn test_chapter_prompt_orders_constraints_first() {
        let p = project();
        let context = CompressedContext {
            world_setting: "修炼体系分为三境。".to_string(),
            characters: "林风(外门弟子)".to_string(),
            ..CompressedContext::default()
        };
        let input = ChapterPromptInput {
            project: &p,
            chapter_title: "第十一章 旧识",
            chapter_outline: "林风重返旧城，发现城门紧闭。",
            previous_content: "",
            context: &context,
            deceased_warning: "【🚨 已故角色名单 - 绝对禁止出场】\n- 赵虎（死于：第十章）\n",
            plot_reminder: "",
            boundary_constraint: "",
            emotion_advice: None,
        };
        let prompt = chapter_prompt(&input);
        let warning_pos = prompt.find("已故角色名单").unwrap();
        let task_pos = prompt.find("请撰写章节").unwrap();
        assert!(warning_pos < task_pos);
        assert!(prompt.contains("2000-3000字"));
        assert!(prompt.contains("第十一章 旧识"));
    }

    #[test]
    fn test_chapter_prompt_includes_emotion_advice() {
        let p = project();
        let context = CompressedContext::default();
        let advice = EmotionAdvice {
            target_intensity: 4,
            target_tension: 3,
            reason: "连续高潮后需要缓冲章节".to_string(),
        };
        let input = ChapterPromptInput {
            project: &p,
            chapter_title: "第十二章",
            chapter_outline: "日常修整。",
            previous_content: "",
            context: &context,
            deceased_warning: "",
            plot_reminder: "",
            boundary_constraint: "",
            emotion_advice: Some(&advice),
        };
        let prompt = chapter_prompt(&input);
        assert!(prompt.contains("连续高潮后需要缓冲章节"));
        assert!(prompt.contains("目标强度4"));
    }

    #[test]
    fn test_continue_prompt_keeps_only_tail() {
        let existing = "开头。".repeat(400);
        let prompt = continue_prompt(&existing, "继续战斗");
        assert!(prompt.chars().count() < existing.chars().count());
        assert!(prompt.contains("继续战斗"));
    }
}
