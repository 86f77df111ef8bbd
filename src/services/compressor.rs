//! Context compression: fixed-size digests of world setting, cast, and
//! volume history for prompt assembly. All budgets are char-based.

use serde::{Deserialize, Serialize};

use crate::domain::models::{Character, HeuristicsConfig, LifeStatus, Volume};
use crate::services::lexicon::Lexicon;

/// Truncate to at most `max` chars, respecting codepoint boundaries.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Compress a world setting description to roughly the configured budget.
///
/// Short settings pass through untouched. Longer ones are reduced to the
/// lines that mention system-level keywords (power system, realms, world
/// rules); when no line qualifies, a flat prefix truncation is used.
pub fn compress_world_setting(
    setting: &str,
    config: &HeuristicsConfig,
    lexicon: &Lexicon,
) -> String {
    if char_len(setting) < config.world_setting_budget {
        return setting.to_string();
    }

    let mut kept: Vec<&str> = Vec::new();
    let mut kept_len = 0usize;
    for line in setting.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let relevant = lexicon
            .world_setting_keywords
            .iter()
            .any(|kw| line.contains(kw.as_str()));
        if relevant {
            kept.push(line);
            kept_len += char_len(line);
            if kept_len > config.world_setting_budget {
                break;
            }
        }
    }

    if kept.is_empty() {
        let mut prefix = truncate_chars(setting, config.world_setting_budget);
        prefix.push_str("...");
        return prefix;
    }
    truncate_chars(&kept.join("；"), config.world_setting_cap)
}

/// One-line digest of the cast: living characters first, capped, with their
/// identity and primary relationship. Falls back to the first two entries
/// when nobody is marked active.
pub fn compress_characters(characters: &[Character], config: &HeuristicsConfig) -> String {
    let render = |character: &Character| {
        if character.identity.is_empty() {
            character.name.clone()
        } else {
            format!("{}({})", character.name, character.identity)
        }
    };

    let active: Vec<&Character> = characters
        .iter()
        .filter(|c| c.status == LifeStatus::Active)
        .take(config.max_digest_characters)
        .collect();

    if active.is_empty() {
        return characters
            .iter()
            .take(2)
            .map(render)
            .collect::<Vec<_>>()
            .join("、");
    }

    active
        .iter()
        .map(|character| {
            let mut entry = render(character);
            if let Some(relation) = character.relationships.first() {
                entry.push_str(&format!("-{}:{}", relation.target_name, relation.relation));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("、")
}

/// One line per volume: curated key points when present, otherwise a short
/// summary excerpt. Empty string for an empty volume list.
pub fn build_volume_index(volumes: &[Volume]) -> String {
    volumes
        .iter()
        .enumerate()
        .map(|(i, volume)| {
            let mut line = format!("第{}卷《{}》", i + 1, volume.title);
            if !volume.key_points.is_empty() {
                line.push_str(&format!(": {}", volume.key_points.join("、")));
            } else if !volume.summary.is_empty() {
                line.push_str(&format!(": {}", truncate_chars(&volume.summary, 50)));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The assembled prompt digest for drafting inside one volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompressedContext {
    pub world_setting: String,
    pub characters: String,
    pub volume_index: String,
    pub previous_volume_key_points: String,
    pub next_volume_key_points: String,
}

/// Build the full compressed context for drafting inside volume
/// `current_index`. Neighbor digests are empty at the edges.
pub fn build_compressed_context(
    world_setting: &str,
    characters: &[Character],
    volumes: &[Volume],
    current_index: usize,
    config: &HeuristicsConfig,
    lexicon: &Lexicon,
) -> CompressedContext {
    let previous = if current_index > 0 {
        volumes.get(current_index - 1).map_or(String::new(), |v| {
            if !v.key_points.is_empty() {
                format!("第{}卷已完成：{}", current_index, v.key_points.join("、"))
            } else if !v.summary.is_empty() {
                format!("第{}卷：{}", current_index, truncate_chars(&v.summary, 100))
            } else {
                String::new()
            }
        })
    } else {
        String::new()
    };

    let next = if current_index + 1 < volumes.len() {
        volumes.get(current_index + 1).map_or(String::new(), |v| {
            if !v.key_points.is_empty() {
                format!("第{}卷预告：{}", current_index + 2, v.key_points.join("、"))
            } else if !v.summary.is_empty() {
                format!(
                    "第{}卷预告：{}",
                    current_index + 2,
                    truncate_chars(&v.summary, 100)
                )
            } else {
                String::new()
            }
        })
    } else {
        String::new()
    };

    CompressedContext {
        world_setting: compress_world_setting(world_setting, config, lexicon),
        characters: compress_characters(characters, config),
        volume_index: build_volume_index(volumes),
        previous_volume_key_points: previous,
        next_volume_key_points: next,
    }
}

/// Local fallback when key-point extraction gets no usable model output:
/// the first three sentences, each clipped to 20 chars.
pub fn fallback_key_points(summary: &str) -> Vec<String> {
    summary
        .split(['。', '！', '？', '；'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(3)
        .map(|s| truncate_chars(s, 20))
        .collect()
}

/// Size accounting for one compression pass. Token counts are a rough
/// chars-per-token estimate, for display only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompressionStats {
    pub original_chars: usize,
    pub compressed_chars: usize,
    pub estimated_tokens_saved: usize,
}

const CHARS_PER_TOKEN: f64 = 1.5;

pub fn compression_stats(original: &str, compressed: &str) -> CompressionStats {
    let original_chars = char_len(original);
    let compressed_chars = char_len(compressed);
    let saved = original_chars.saturating_sub(compressed_chars);
    CompressionStats {
        original_chars,
        compressed_chars,
        estimated_tokens_saved: (saved as f64 / CHARS_PER_TOKEN).round() as usize,
    }
}
