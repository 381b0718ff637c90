//! Host-side quiz progress tracking.
//!
//! Scoring presentation belongs to the display layer; this module only keeps
//! the numbers honest: points accumulate per correct answer and the streak
//! resets on a wrong one.

use crate::design::QuizQuestion;

/// The outcome of answering one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub explanation: String,
    pub score: u32,
    pub streak: u32,
}

/// Progress through one quiz.
#[derive(Debug)]
pub struct QuizRun {
    questions: Vec<QuizQuestion>,
    score: u32,
    streak: u32,
    best_streak: u32,
}

impl QuizRun {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            score: 0,
            streak: 0,
            best_streak: 0,
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    /// Records an answer for the question at `index`.
    ///
    /// Returns `None` when the index is out of range. A correct answer adds
    /// the question's points (default 1) and extends the streak; a wrong one
    /// resets the streak to zero.
    pub fn answer(&mut self, index: usize, choice: usize) -> Option<AnswerOutcome> {
        let question = self.questions.get(index)?;
        let correct = choice == question.correct_answer;
        if correct {
            self.score += question.points.unwrap_or(1);
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
        Some(AnswerOutcome {
            correct,
            explanation: question.explanation.clone(),
            score: self.score,
            streak: self.streak,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: usize, points: Option<u32>) -> QuizQuestion {
        QuizQuestion {
            question: "Q1".to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            correct_answer: correct,
            explanation: "because".to_string(),
            difficulty: None,
            points,
        }
    }

    #[test]
    fn correct_answer_increments_score_and_streak() {
        let mut run = QuizRun::new(vec![question(0, None)]);
        let outcome = run.answer(0, 0).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.streak, 1);
        assert_eq!(outcome.explanation, "because");
    }

    #[test]
    fn wrong_answer_resets_the_streak_but_keeps_the_score() {
        let mut run = QuizRun::new(vec![
            question(0, None),
            question(0, None),
            question(0, None),
        ]);
        run.answer(0, 0);
        run.answer(1, 0);
        assert_eq!(run.streak(), 2);

        let outcome = run.answer(2, 1).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.streak, 0);
        assert_eq!(outcome.score, 2);
        assert_eq!(run.best_streak(), 2);
    }

    #[test]
    fn custom_points_are_honored() {
        let mut run = QuizRun::new(vec![question(1, Some(5))]);
        let outcome = run.answer(0, 1).unwrap();
        assert_eq!(outcome.score, 5);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut run = QuizRun::new(vec![question(0, None)]);
        assert!(run.answer(3, 0).is_none());
    }
}
