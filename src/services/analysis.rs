//! Model-assisted analysis: entity extraction, plot thread detection, and
//! batch chapter archiving.
//!
//! All batch operations run strictly sequentially with a fixed inter-call
//! delay; the backend enforces its own rate limit but burst-free batches
//! keep long archive runs well inside free-tier quotas. Malformed model
//! output never fails an operation: it decodes to the empty payload.

use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::models::{
    decode_lenient, ChapterCharacterAnalysis, Codex, EntityExtraction, GeneratorConfig,
    Importance, KeyPointsPayload, PlotDetection, PlotThread, Volume,
    DETECTED_RESOLUTION_HORIZON,
};
use crate::domain::ports::{GenerationRequest, TextGenerator};
use crate::services::compressor::fallback_key_points;

/// Chars of chapter content included in an analysis prompt.
const PROMPT_CONTENT_BUDGET: usize = 3000;

fn clip_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Consolidated archive entry for one character across many chapters.
#[derive(Debug, Clone, Default)]
pub struct CharacterArchiveEntry {
    pub name: String,
    /// Chapter titles, deduplicated, in reading order.
    pub appearances: Vec<String>,
    /// First observed death wins: (chapter title, cause).
    pub death: Option<(String, String)>,
    /// Relation per counterpart name; first observation wins.
    pub relationships: BTreeMap<String, String>,
}

/// Analysis orchestration over the generative text port.
pub struct AnalysisService {
    generator: Arc<dyn TextGenerator>,
    config: GeneratorConfig,
}

impl AnalysisService {
    pub fn new(generator: Arc<dyn TextGenerator>, config: GeneratorConfig) -> Self {
        Self { generator, config }
    }

    /// Extract entities, attribute changes, and relations from one chapter.
    /// Transport failures propagate; malformed output decodes to empty.
    #[instrument(skip_all, fields(chapter_index))]
    pub async fn extract_entities(
        &self,
        chapter_content: &str,
        chapter_index: usize,
        codex: &Codex,
    ) -> Result<EntityExtraction> {
        let mut existing = String::new();
        for entity in &codex.entities {
            let _ = writeln!(
                existing,
                "- {}（{}）",
                entity.name,
                entity.entity_type.label()
            );
        }
        if existing.is_empty() {
            existing.push_str("（暂无）\n");
        }

        let prompt = format!(
            "你是小说设定集管理员。请从以下章节内容中提取：新出现的实体（角色/地点/物品/势力/概念）、已有实体的属性变化、实体之间的新关系。\n\n\
             【已有实体】\n{existing}\n\
             【第{}章内容】\n{}\n\n\
             只输出JSON，不要任何解释，格式：\n\
             {{\"newEntities\":[{{\"name\":\"\",\"type\":\"character|location|item|faction|concept\",\"aliases\":[],\"description\":\"\"}}],\
             \"entityUpdates\":[{{\"name\":\"\",\"attributeChanges\":[{{\"key\":\"\",\"value\":\"\"}}]}}],\
             \"newRelations\":[{{\"source\":\"\",\"target\":\"\",\"relation\":\"\"}}]}}",
            chapter_index + 1,
            clip_chars(chapter_content, PROMPT_CONTENT_BUDGET),
        );

        let raw = self
            .generator
            .generate(GenerationRequest::new(prompt))
            .await?;
        Ok(decode_lenient(&raw))
    }

    /// Detect plot threads planted, hinted, or resolved in one chapter.
    #[instrument(skip_all, fields(chapter_index))]
    pub async fn detect_plot_threads(
        &self,
        chapter_content: &str,
        chapter_index: usize,
        threads: &[PlotThread],
    ) -> Result<PlotDetection> {
        let mut open = String::new();
        for thread in threads.iter().filter(|t| t.status.is_open()) {
            let _ = writeln!(open, "[{}] {}", thread.id, thread.description);
        }
        if open.is_empty() {
            open.push_str("（暂无）\n");
        }

        let prompt = format!(
            "你是小说伏笔管理员。请分析以下章节：是否埋设了新伏笔、是否对已有伏笔做了暗示、是否揭晓了已有伏笔。\n\n\
             【未揭晓的伏笔】\n{open}\n\
             【第{}章内容】\n{}\n\n\
             只输出JSON，格式：\n\
             {{\"newThreads\":[{{\"description\":\"\",\"importance\":\"minor|major|critical\",\"relatedCharacters\":[],\"expectedChaptersToResolve\":30}}],\
             \"hints\":[{{\"threadId\":\"\",\"hint\":\"\"}}],\"resolved\":[\"threadId\"]}}",
            chapter_index + 1,
            clip_chars(chapter_content, PROMPT_CONTENT_BUDGET),
        );

        let raw = self
            .generator
            .generate(GenerationRequest::new(prompt))
            .await?;
        Ok(decode_lenient(&raw))
    }

    /// Character-centric analysis of one chapter.
    #[instrument(skip_all)]
    pub async fn analyze_chapter_for_characters(
        &self,
        chapter_title: &str,
        chapter_content: &str,
    ) -> Result<ChapterCharacterAnalysis> {
        let prompt = format!(
            "请分析章节《{chapter_title}》：哪些角色出场了、是否有角色死亡、角色之间出现了哪些关系。\n\n\
             【章节内容】\n{}\n\n\
             只输出JSON，格式：\n\
             {{\"appearances\":[\"角色名\"],\"deaths\":[{{\"name\":\"\",\"cause\":\"\"}}],\
             \"relationships\":[{{\"source\":\"\",\"target\":\"\",\"relation\":\"\"}}]}}",
            clip_chars(chapter_content, PROMPT_CONTENT_BUDGET),
        );

        let raw = self
            .generator
            .generate(GenerationRequest::new(prompt))
            .await?;
        Ok(decode_lenient(&raw))
    }

    /// Analyze every chapter in order, one request at a time with a fixed
    /// delay between calls. `progress(done, total)` fires after each
    /// chapter. Returns the per-chapter analyses in input order.
    pub async fn analyze_all_chapters<F>(
        &self,
        chapters: &[(String, String)],
        mut progress: F,
    ) -> Result<Vec<ChapterCharacterAnalysis>>
    where
        F: FnMut(usize, usize),
    {
        let total = chapters.len();
        let mut analyses = Vec::with_capacity(total);
        for (index, (title, content)) in chapters.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }
            debug!(chapter = %title, "analyzing chapter");
            let analysis = self.analyze_chapter_for_characters(title, content).await?;
            analyses.push(analysis);
            progress(index + 1, total);
        }
        info!(total, "chapter archive analysis complete");
        Ok(analyses)
    }

    /// Distill 3-5 key points from a volume summary, falling back to the
    /// first sentences when the model returns nothing usable.
    #[instrument(skip_all, fields(volume = %volume.title))]
    pub async fn extract_volume_key_points(&self, volume: &Volume) -> Result<Vec<String>> {
        let prompt = format!(
            "请从以下卷简介中提炼3-5个关键剧情点，每个不超过20字。\n\n\
             【卷名】{}\n【简介】\n{}\n\n\
             只输出JSON，格式：{{\"keyPoints\":[\"\",\"\"]}}",
            volume.title, volume.summary,
        );
        let raw = self
            .generator
            .generate(GenerationRequest::new(prompt))
            .await?;
        let payload: KeyPointsPayload = decode_lenient(&raw);
        if payload.key_points.is_empty() {
            return Ok(fallback_key_points(&volume.summary));
        }
        Ok(payload.key_points)
    }

    /// Fill in key points for every volume that lacks them, sequentially
    /// with the batch delay. Volumes that already have key points are
    /// skipped without a model call.
    pub async fn extract_all_volume_key_points<F>(
        &self,
        volumes: &mut [Volume],
        mut progress: F,
    ) -> Result<()>
    where
        F: FnMut(usize, usize),
    {
        let total = volumes.len();
        let mut made_request = false;
        for (index, volume) in volumes.iter_mut().enumerate() {
            if volume.key_points.is_empty() && !volume.summary.is_empty() {
                if made_request {
                    tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
                }
                volume.key_points = self.extract_volume_key_points(volume).await?;
                made_request = true;
            }
            progress(index + 1, total);
        }
        Ok(())
    }
}

/// Apply a plot detection payload to the thread list.
///
/// New threads are planted at `chapter_index` with the model's horizon
/// estimate (default 30 chapters); hints and resolutions are matched by id
/// and silently dropped when the id is unknown or the thread is terminal.
pub fn apply_plot_detection(
    threads: &mut Vec<PlotThread>,
    detection: &PlotDetection,
    chapter_index: usize,
) {
    for detected in &detection.new_threads {
        if detected.description.is_empty() {
            continue;
        }
        let horizon = detected
            .expected_chapters_to_resolve
            .unwrap_or(DETECTED_RESOLUTION_HORIZON);
        let importance =
            Importance::from_str(detected.importance.trim()).unwrap_or(Importance::Major);
        threads.push(
            PlotThread::with_horizon(detected.description.clone(), chapter_index, horizon)
                .with_importance(importance)
                .with_related_characters(detected.related_characters.clone()),
        );
    }

    for hint in &detection.hints {
        let Ok(id) = hint.thread_id.parse::<Uuid>() else {
            continue;
        };
        if let Some(thread) = threads.iter_mut().find(|t| t.id == id) {
            thread.add_hint(chapter_index, hint.hint.clone());
        }
    }

    for resolved_id in &detection.resolved {
        let Ok(id) = resolved_id.parse::<Uuid>() else {
            continue;
        };
        if let Some(thread) = threads.iter_mut().find(|t| t.id == id) {
            thread.resolve(chapter_index);
        }
    }
}

/// Fold per-chapter analyses into per-character archive entries.
///
/// `chapter_titles` must parallel `analyses`. Appearances are deduplicated
/// per character, the first observed death wins, and relationships are
/// recorded on both endpoints.
pub fn merge_character_analyses(
    chapter_titles: &[String],
    analyses: &[ChapterCharacterAnalysis],
) -> Vec<CharacterArchiveEntry> {
    fn entry_mut<'a>(
        archive: &'a mut BTreeMap<String, CharacterArchiveEntry>,
        name: &str,
    ) -> &'a mut CharacterArchiveEntry {
        archive
            .entry(name.to_string())
            .or_insert_with(|| CharacterArchiveEntry {
                name: name.to_string(),
                ..CharacterArchiveEntry::default()
            })
    }

    let mut archive: BTreeMap<String, CharacterArchiveEntry> = BTreeMap::new();
    for (title, analysis) in chapter_titles.iter().zip(analyses) {
        for name in &analysis.appearances {
            if name.is_empty() {
                continue;
            }
            let entry = entry_mut(&mut archive, name);
            if !entry.appearances.contains(title) {
                entry.appearances.push(title.clone());
            }
        }
        for death in &analysis.deaths {
            if death.name.is_empty() {
                continue;
            }
            let entry = entry_mut(&mut archive, &death.name);
            if entry.death.is_none() {
                entry.death = Some((title.clone(), death.cause.clone()));
            }
        }
        for relation in &analysis.relationships {
            if relation.source.is_empty() || relation.target.is_empty() {
                continue;
            }
            entry_mut(&mut archive, &relation.source)
                .relationships
                .entry(relation.target.clone())
                .or_insert_with(|| relation.relation.clone());
            entry_mut(&mut archive, &relation.target)
                .relationships
                .entry(relation.source.clone())
                .or_insert_with(|| relation.relation.clone());
        }
    }
    archive.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{DetectedHint, DetectedThread, ExtractedRelation, ObservedDeath};

    #[test]
    fn test_apply_detection_plants_new_threads() {
        let mut threads = Vec::new();
        let detection = PlotDetection {
            new_threads: vec![DetectedThread {
                description: "神秘玉佩".to_string(),
                importance: "critical".to_string(),
                related_characters: vec!["林风".to_string()],
                expected_chapters_to_resolve: Some(12),
            }],
            hints: vec![],
            resolved: vec![],
        };
        apply_plot_detection(&mut threads, &detection, 7);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].planted_chapter, 7);
        assert_eq!(threads[0].expected_resolution.min, 12);
        assert_eq!(threads[0].expected_resolution.max, 19);
        assert_eq!(threads[0].importance, Importance::Critical);
    }

    #[test]
    fn test_apply_detection_defaults() {
        let mut threads = Vec::new();
        let detection = PlotDetection {
            new_threads: vec![DetectedThread {
                description: "黑衣人身份".to_string(),
                importance: "也许重要".to_string(),
                related_characters: vec![],
                expected_chapters_to_resolve: None,
            }],
            hints: vec![],
            resolved: vec![],
        };
        apply_plot_detection(&mut threads, &detection, 4);
        assert_eq!(threads[0].expected_resolution.max, 34);
        assert_eq!(threads[0].importance, Importance::Major);
    }

    #[test]
    fn test_apply_detection_hints_and_resolution() {
        let mut threads = vec![PlotThread::new("玉佩来历", 0)];
        let id = threads[0].id.to_string();
        let detection = PlotDetection {
            new_threads: vec![],
            hints: vec![
                DetectedHint {
                    thread_id: id.clone(),
                    hint: "玉佩发烫".to_string(),
                },
                DetectedHint {
                    thread_id: "not-a-uuid".to_string(),
                    hint: "丢弃".to_string(),
                },
            ],
            resolved: vec![id],
        };
        apply_plot_detection(&mut threads, &detection, 20);
        assert_eq!(threads[0].hints.len(), 1);
        assert_eq!(threads[0].resolved_chapter, Some(20));
    }

    #[test]
    fn test_merge_first_death_wins_and_appearances_dedup() {
        let titles = vec!["第一章".to_string(), "第二章".to_string()];
        let analyses = vec![
            ChapterCharacterAnalysis {
                appearances: vec!["赵虎".to_string(), "林风".to_string()],
                deaths: vec![ObservedDeath {
                    name: "赵虎".to_string(),
                    cause: "坠崖".to_string(),
                }],
                relationships: vec![],
            },
            ChapterCharacterAnalysis {
                appearances: vec!["林风".to_string()],
                deaths: vec![ObservedDeath {
                    name: "赵虎".to_string(),
                    cause: "旧伤复发".to_string(),
                }],
                relationships: vec![],
            },
        ];
        let archive = merge_character_analyses(&titles, &analyses);
        let zhao_hu = archive.iter().find(|e| e.name == "赵虎").unwrap();
        assert_eq!(
            zhao_hu.death,
            Some(("第一章".to_string(), "坠崖".to_string()))
        );
        let lin_feng = archive.iter().find(|e| e.name == "林风").unwrap();
        assert_eq!(lin_feng.appearances, vec!["第一章", "第二章"]);
    }

    #[test]
    fn test_merge_relationships_both_directions() {
        let titles = vec!["第三章".to_string()];
        let analyses = vec![ChapterCharacterAnalysis {
            appearances: vec![],
            deaths: vec![],
            relationships: vec![ExtractedRelation {
                source: "林风".to_string(),
                target: "苏瑶".to_string(),
                relation: "同门".to_string(),
            }],
        }];
        let archive = merge_character_analyses(&titles, &analyses);
        assert_eq!(archive.len(), 2);
        assert_eq!(
            archive
                .iter()
                .find(|e| e.name == "苏瑶")
                .unwrap()
                .relationships
                .get("林风"),
            Some(&"同门".to_string())
        );
    }
}
