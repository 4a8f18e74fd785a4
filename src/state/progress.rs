use super::GameSession;

impl GameSession {
    /// Move to the next answer of the current question.
    /// The caller knows how many answers the question has; no bound is enforced here.
    pub fn advance_answer(&mut self) {
        self.current_answer_index += 1;
    }

    /// Move to the next question, back to its first answer
    pub fn advance_question(&mut self) {
        self.current_question = self.current_question.saturating_add(1);
        self.current_answer_index = 0;
        tracing::debug!("Advanced to question {}", self.current_question);
    }

    /// Jump straight to a question, back to its first answer
    pub fn jump_to_question(&mut self, question: u32) {
        self.current_question = question;
        self.current_answer_index = 0;
    }
}
