use super::{GameSession, SessionError, SessionResult};
use crate::store::{GUESSES_KEY, SHUFFLED_ORDER_KEY};
use crate::types::*;

impl GameSession {
    /// Record (or overwrite) the guessed owner of the answer at `answer_index`
    pub fn record_guess(
        &mut self,
        question_id: &str,
        answer_index: usize,
        participant_id: &str,
    ) -> SessionResult<()> {
        self.guesses
            .entry(question_id.to_string())
            .or_default()
            .insert(answer_index, participant_id.to_string());

        tracing::debug!(
            "Guess for question {} answer {}: {}",
            question_id,
            answer_index,
            participant_id
        );

        self.persist(GUESSES_KEY, &self.guesses)
    }

    pub fn guess_for(&self, question_id: &str, answer_index: usize) -> Option<&ParticipantId> {
        self.guesses.get(question_id)?.get(&answer_index)
    }

    pub fn guesses_for(&self, question_id: &str) -> Option<&QuestionGuesses> {
        self.guesses.get(question_id)
    }

    pub fn shuffled_order(&self, question_id: &str) -> Option<&[AnswerRecord]> {
        self.shuffled_orders.get(question_id).map(Vec::as_slice)
    }

    /// Fix the answer order of a question.
    ///
    /// Guesses are recorded by position, so an order can only be set once;
    /// it is cleared by `reset`.
    pub fn save_shuffled_order(
        &mut self,
        question_id: &str,
        records: Vec<AnswerRecord>,
    ) -> SessionResult<()> {
        if self.shuffled_orders.contains_key(question_id) {
            return Err(SessionError::ShuffleAlreadyFixed(question_id.to_string()));
        }

        self.shuffled_orders.insert(question_id.to_string(), records);
        self.persist(SHUFFLED_ORDER_KEY, &self.shuffled_orders)
    }

    /// The fixed order of a question, generating and saving it on first use
    pub fn shuffled_order_or_insert_with<F>(
        &mut self,
        question_id: &str,
        generate: F,
    ) -> SessionResult<&[AnswerRecord]>
    where
        F: FnOnce() -> Vec<AnswerRecord>,
    {
        if !self.shuffled_orders.contains_key(question_id) {
            let records = generate();
            tracing::info!(
                "Shuffled {} answers for question {}",
                records.len(),
                question_id
            );
            self.save_shuffled_order(question_id, records)?;
        }

        self.shuffled_order(question_id)
            .ok_or_else(|| SessionError::NoShuffledOrder(question_id.to_string()))
    }
}
