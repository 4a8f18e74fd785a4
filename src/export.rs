//! Results formatting for display, download and sharing.
//!
//! Everything here is a pure transformation of the scored session, except
//! the clipboard/share helpers, which hand text to a platform sink and
//! report failure as `false` instead of an error.

use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const RESULTS_TITLE: &str = "Résultats Guess Who";
pub const CSV_HEADER: &str = "Rang,Nom,Bonnes Réponses,Total,Pourcentage";

/// Ranked results, as downloaded in the JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsExport {
    #[serde(rename = "date")]
    pub generated_at: DateTime<Utc>,
    pub summary: ResultsSummary,
    pub ranking: Vec<RankingEntry>,
    pub detailed_results: ValidationMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultsSummary {
    /// Number of questions with validation results
    pub total_questions: usize,
    pub total_participants: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingEntry {
    pub rank: usize,
    pub name: String,
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

/// Payload for a native share sheet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
}

pub fn format_results(
    participants: &[Participant],
    scores: &ScoreBoard,
    validation: &ValidationMap,
) -> ResultsExport {
    format_results_at(participants, scores, validation, Utc::now())
}

/// Rank participants by percentage, then by number of correct guesses.
/// Participants without a score rank with zero.
pub fn format_results_at(
    participants: &[Participant],
    scores: &ScoreBoard,
    validation: &ValidationMap,
    generated_at: DateTime<Utc>,
) -> ResultsExport {
    let mut scored: Vec<(&Participant, Score)> = participants
        .iter()
        .map(|p| (p, scores.get(&p.id).copied().unwrap_or_default()))
        .collect();

    scored.sort_by(|(_, a), (_, b)| {
        b.percentage
            .cmp(&a.percentage)
            .then_with(|| b.correct.cmp(&a.correct))
    });

    let ranking = scored
        .into_iter()
        .enumerate()
        .map(|(idx, (p, score))| RankingEntry {
            rank: idx + 1,
            name: p.name.clone(),
            correct: score.correct,
            total: score.total,
            percentage: score.percentage,
        })
        .collect();

    ResultsExport {
        generated_at,
        summary: ResultsSummary {
            total_questions: validation.len(),
            total_participants: participants.len(),
        },
        ranking,
        detailed_results: validation.clone(),
    }
}

pub fn to_json(export: &ResultsExport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(export)
}

fn csv_field(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn to_csv(export: &ResultsExport) -> String {
    let rows = export
        .ranking
        .iter()
        .map(|p| {
            format!(
                "{},{},{},{},{}%",
                p.rank,
                csv_field(&p.name),
                p.correct,
                p.total,
                p.percentage
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n{}", CSV_HEADER, rows)
}

/// Download name, e.g. `guess-who-results-2024-06-01.csv`
pub fn export_file_name(export: &ResultsExport, extension: &str) -> String {
    format!(
        "guess-who-results-{}.{}",
        export.generated_at.format("%Y-%m-%d"),
        extension
    )
}

fn medal(rank: usize) -> &'static str {
    match rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "  ",
    }
}

/// Full ranking as plain text
pub fn clipboard_text(export: &ResultsExport) -> String {
    let mut text = format!("🏆 {} 🏆\n\n", RESULTS_TITLE);
    text += &format!("Date: {}\n", export.generated_at.format("%d/%m/%Y"));
    text += &format!("Questions: {}\n", export.summary.total_questions);
    text += &format!("Participants: {}\n\n", export.summary.total_participants);
    text += "=== CLASSEMENT ===\n\n";

    for p in &export.ranking {
        text += &format!(
            "{} {}. {}: {}/{} ({}%)\n",
            medal(p.rank),
            p.rank,
            p.name,
            p.correct,
            p.total,
            p.percentage
        );
    }

    text
}

/// Top three for the share sheet
pub fn share_payload(export: &ResultsExport) -> SharePayload {
    let mut text = format!("🏆 {} 🏆\n\nTop 3:\n", RESULTS_TITLE);
    for p in export.ranking.iter().take(3) {
        text += &format!("{} {}: {}%\n", medal(p.rank), p.name, p.percentage);
    }

    SharePayload {
        title: RESULTS_TITLE.to_string(),
        text,
    }
}

/// Errors from platform clipboard/share integrations
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Clipboard write failed: {0}")]
    Clipboard(String),

    #[error("Share failed: {0}")]
    Share(String),

    #[error("Sharing is not supported here")]
    ShareUnsupported,
}

#[async_trait]
pub trait ClipboardSink: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ExportError>;
}

#[async_trait]
pub trait ShareSink: Send + Sync {
    async fn share(&self, payload: &SharePayload) -> Result<(), ExportError>;
}

/// Copy the ranking to the clipboard. Returns false on failure.
pub async fn copy_to_clipboard(sink: &dyn ClipboardSink, export: &ResultsExport) -> bool {
    match sink.write_text(&clipboard_text(export)).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to copy results: {}", e);
            false
        }
    }
}

/// Share the top three. Returns false when sharing is unavailable or fails.
pub async fn share_results(sink: Option<&dyn ShareSink>, export: &ResultsExport) -> bool {
    let Some(sink) = sink else {
        tracing::info!("{}", ExportError::ShareUnsupported);
        return false;
    };

    match sink.share(&share_payload(export)).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to share results: {}", e);
            false
        }
    }
}
