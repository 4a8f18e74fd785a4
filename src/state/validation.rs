use super::{GameSession, SessionError, SessionResult};
use crate::store::VALIDATION_RESULTS_KEY;
use crate::types::*;

impl GameSession {
    /// Check every recorded guess of a question against the true owners.
    ///
    /// `correct_owners[i]` is the owner of the answer at position `i`.
    /// Only guessed positions get an entry. Re-running with the same guesses
    /// gives the same result.
    pub fn validate(
        &mut self,
        question_id: &str,
        correct_owners: &[ParticipantId],
    ) -> SessionResult<QuestionValidation> {
        let results: QuestionValidation = self
            .guesses
            .get(question_id)
            .into_iter()
            .flatten()
            .map(|(&index, guessed)| {
                let correct = correct_owners.get(index);
                let entry = ValidationEntry {
                    is_correct: correct == Some(guessed),
                    correct_participant_id: correct.cloned(),
                };
                (index, entry)
            })
            .collect();

        let correct_count = results.values().filter(|r| r.is_correct).count();
        tracing::info!(
            "Validated question {}: {}/{} correct",
            question_id,
            correct_count,
            results.len()
        );

        self.validation_results
            .insert(question_id.to_string(), results.clone());
        self.persist(VALIDATION_RESULTS_KEY, &self.validation_results)?;

        Ok(results)
    }

    /// Validate against the owners of the question's fixed answer order
    pub fn validate_shuffled(&mut self, question_id: &str) -> SessionResult<QuestionValidation> {
        let owners: Vec<ParticipantId> = self
            .shuffled_order(question_id)
            .ok_or_else(|| SessionError::NoShuffledOrder(question_id.to_string()))?
            .iter()
            .map(|record| record.owner_id.clone())
            .collect();

        self.validate(question_id, &owners)
    }

    pub fn validation_for(&self, question_id: &str) -> Option<&QuestionValidation> {
        self.validation_results.get(question_id)
    }
}
