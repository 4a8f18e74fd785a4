use super::GameSession;
use crate::types::*;

impl GameSession {
    /// Per-participant scores over every validated question.
    ///
    /// A participant's `total` counts how many of their answers were guessed,
    /// `correct` how many of those were attributed to them. Always recomputed
    /// from the validation results; nothing here is stored.
    pub fn compute_scores(&self, participants: &[Participant]) -> ScoreBoard {
        let mut scores: ScoreBoard = participants
            .iter()
            .map(|p| (p.id.clone(), Score::default()))
            .collect();

        for results in self.validation_results.values() {
            for result in results.values() {
                let Some(owner) = &result.correct_participant_id else {
                    continue;
                };

                let score = scores.entry(owner.clone()).or_insert_with(|| {
                    tracing::warn!("Validation result for unknown participant {}", owner);
                    Score::default()
                });
                score.total += 1;
                if result.is_correct {
                    score.correct += 1;
                }
            }
        }

        for score in scores.values_mut() {
            score.percentage = Score::percentage_of(score.correct, score.total);
        }

        scores
    }
}
