use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::difficulty::Difficulty;
use super::geometry::{GeometryOracle, Point};
use super::overlay::FeedbackOverlays;
use super::source::{QuestionSource, SourceError};
use super::{AnswerEvaluation, GamePhase, Question};

/// Buffer distance, in map units, applied to the reference geometry when a
/// feedback region is recorded. Display-only; scoring always tests the
/// unbuffered geometry.
pub const FEEDBACK_BUFFER_DISTANCE: f64 = 0.5;

#[derive(Debug, Error)]
pub enum GameError {
    /// The record loaded but a required attribute was null. The cursor has
    /// already moved onto the record by the time this is returned.
    #[error("question record {index} is missing its '{field}' attribute")]
    MissingAttribute { index: usize, field: &'static str },
    #[error("expected the game to be in the {expected:?} phase, found {found:?}")]
    WrongPhase {
        expected: GamePhase,
        found: GamePhase,
    },
    #[error("no question is currently active")]
    NoActiveQuestion,
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Position within the deck. `index` starts at -1 (nothing shown yet) and
/// increments on every advance, including past the end, so the only way to
/// notice the deck is spent is to check the bounds here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCursor {
    pub index: i64,
    pub total: usize,
}

impl QuestionCursor {
    pub fn in_range(&self) -> bool {
        self.index >= 0 && (self.index as u64) < self.total as u64
    }

    /// True once no further question can be produced.
    pub fn is_exhausted(&self) -> bool {
        self.index + 1 >= self.total as i64
    }
}

/// State-change notifications, queued by the engine and drained by the
/// presentation layer via [`QuizEngine::take_events`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    PhaseChanged(GamePhase),
    DifficultyChanged(Difficulty),
    ScoreChanged(u32),
    CursorMoved(i64),
    NewQuestion,
    AnswerEvaluated { is_correct: bool },
}

/// Drives the game: phase transitions, question sequencing and scoring.
///
/// The engine expects strictly sequential use; never call a second mutating
/// operation while an `advance_question` is still awaiting its fetch. The bot
/// gets this for free because each dialogue owns its engine and Telegram
/// updates for a chat are handled one at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizEngine {
    phase: GamePhase,
    difficulty: Difficulty,
    points: u32,
    cursor: QuestionCursor,
    current: Option<Question>,
    last_evaluation: Option<AnswerEvaluation>,
    overlays: Option<FeedbackOverlays>,
    events: Vec<EngineEvent>,
}

impl QuizEngine {
    pub fn new(total: usize) -> Self {
        Self {
            phase: GamePhase::default(),
            difficulty: Difficulty::default(),
            points: 0,
            cursor: QuestionCursor { index: -1, total },
            current: None,
            last_evaluation: None,
            overlays: None,
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn cursor(&self) -> QuestionCursor {
        self.cursor
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn last_evaluation(&self) -> Option<AnswerEvaluation> {
        self.last_evaluation
    }

    /// Feedback overlays, once the first answer has been submitted.
    pub fn overlays(&self) -> Option<&FeedbackOverlays> {
        self.overlays.as_ref()
    }

    /// Drains the queued notifications.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begins play. Does not advance the cursor; a question staged before the
    /// difficulty was chosen stays current.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.phase != GamePhase::ChoosingDifficulty {
            return Err(GameError::WrongPhase {
                expected: GamePhase::ChoosingDifficulty,
                found: self.phase,
            });
        }
        self.set_phase(GamePhase::Playing);
        Ok(())
    }

    /// Unconditional; picking a difficulty mid-round changes the multiplier
    /// for the next correct answer.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.events.push(EngineEvent::DifficultyChanged(difficulty));
    }

    /// Moves the cursor forward and, while it is in range, loads that record
    /// and makes it the current question.
    ///
    /// Past the end of the deck this quietly does nothing besides moving the
    /// cursor. A record missing its question or answer attribute fails with
    /// [`GameError::MissingAttribute`] after the cursor has already moved on;
    /// the previous question stays current.
    pub async fn advance_question<S>(&mut self, source: &S) -> Result<(), GameError>
    where
        S: QuestionSource + ?Sized,
    {
        self.cursor.index += 1;
        self.events.push(EngineEvent::CursorMoved(self.cursor.index));

        if !self.cursor.in_range() {
            return Ok(());
        }

        let index = self.cursor.index as usize;
        let record = source.fetch(index).await?;

        let prompt = record.question.ok_or(GameError::MissingAttribute {
            index,
            field: "question",
        })?;
        let answer = record.answer.ok_or(GameError::MissingAttribute {
            index,
            field: "answer",
        })?;

        self.current = Some(Question::new(prompt, answer, record.geometry));
        self.events.push(EngineEvent::NewQuestion);
        Ok(())
    }

    /// Evaluates an answer point against the current question, scores it and
    /// records a feedback region.
    pub fn submit_user_answer(
        &mut self,
        point: Point,
        oracle: &impl GeometryOracle,
    ) -> Result<AnswerEvaluation, GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::WrongPhase {
                expected: GamePhase::Playing,
                found: self.phase,
            });
        }
        let geometry = match self.current.as_ref() {
            Some(question) => question.geometry.clone(),
            None => return Err(GameError::NoActiveQuestion),
        };

        // The overlays come up before anything is evaluated.
        let overlays = self.overlays.get_or_insert_with(FeedbackOverlays::new);

        let buffered = oracle.buffer(&geometry, FEEDBACK_BUFFER_DISTANCE);
        let is_correct = oracle.contains(&geometry, &point);
        overlays.record(buffered, is_correct);

        if is_correct {
            self.points += self.difficulty.multiplier();
            self.events.push(EngineEvent::ScoreChanged(self.points));
        }

        let evaluation = AnswerEvaluation {
            is_correct,
            submitted_point: point,
        };
        self.last_evaluation = Some(evaluation);
        self.events.push(EngineEvent::AnswerEvaluated { is_correct });
        self.set_phase(GamePhase::AnswerSubmitted);
        Ok(evaluation)
    }

    /// Returns to play and moves on to the next question.
    pub async fn request_next_question<S>(&mut self, source: &S) -> Result<(), GameError>
    where
        S: QuestionSource + ?Sized,
    {
        self.set_phase(GamePhase::Playing);
        self.advance_question(source).await
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            self.phase = phase;
            self.events.push(EngineEvent::PhaseChanged(phase));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::geometry::{Geometry, PlanarOracle, Polygon};
    use crate::quiz::source::{MemoryQuestionSource, QuestionRecord};

    const INSIDE: Point = Point { x: 2.0, y: 2.0 };
    const OUTSIDE: Point = Point { x: 9.0, y: 9.0 };

    fn square() -> Geometry {
        Geometry::Polygon(Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ]))
    }

    fn record(question: &str, answer: &str) -> QuestionRecord {
        QuestionRecord {
            question: Some(question.to_string()),
            answer: Some(answer.to_string()),
            geometry: square(),
        }
    }

    fn deck(records: Vec<QuestionRecord>) -> MemoryQuestionSource {
        MemoryQuestionSource::new(records)
    }

    fn single_question_deck() -> MemoryQuestionSource {
        deck(vec![record("Where is Lake Baikal?", "Siberia")])
    }

    /// Engine with the first question loaded and play started, events drained.
    async fn playing_engine(source: &MemoryQuestionSource) -> QuizEngine {
        let mut engine = QuizEngine::new(source.len());
        engine.advance_question(source).await.unwrap();
        engine.start().unwrap();
        engine.take_events();
        engine
    }

    #[tokio::test]
    async fn correct_answer_scores_the_multiplier() {
        let source = single_question_deck();
        let mut engine = playing_engine(&source).await;

        let evaluation = engine.submit_user_answer(INSIDE, &PlanarOracle).unwrap();
        assert!(evaluation.is_correct);
        assert_eq!(engine.points(), 1);
        assert_eq!(engine.phase(), GamePhase::AnswerSubmitted);
        assert_eq!(engine.cursor().index, 0);
        assert_eq!(engine.overlays().unwrap().correct().len(), 1);
        assert_eq!(engine.overlays().unwrap().incorrect().len(), 0);
    }

    #[tokio::test]
    async fn wrong_answer_scores_nothing() {
        let source = single_question_deck();
        let mut engine = playing_engine(&source).await;

        let evaluation = engine.submit_user_answer(OUTSIDE, &PlanarOracle).unwrap();
        assert!(!evaluation.is_correct);
        assert_eq!(engine.points(), 0);
        assert_eq!(engine.phase(), GamePhase::AnswerSubmitted);
        assert_eq!(engine.overlays().unwrap().incorrect().len(), 1);
        assert_eq!(engine.overlays().unwrap().correct().len(), 0);
    }

    #[tokio::test]
    async fn each_difficulty_pays_its_multiplier() {
        for (difficulty, expected) in [
            (Difficulty::Easy, 1),
            (Difficulty::Medium, 2),
            (Difficulty::Hard, 3),
        ] {
            let source = single_question_deck();
            let mut engine = QuizEngine::new(source.len());
            engine.set_difficulty(difficulty);
            engine.advance_question(&source).await.unwrap();
            engine.start().unwrap();

            engine.submit_user_answer(INSIDE, &PlanarOracle).unwrap();
            assert_eq!(engine.points(), expected);
        }
    }

    #[tokio::test]
    async fn score_never_decreases() {
        let source = deck(vec![
            record("Q1", "A1"),
            record("Q2", "A2"),
            record("Q3", "A3"),
        ]);
        let mut engine = playing_engine(&source).await;
        engine.set_difficulty(Difficulty::Medium);

        let mut previous = 0;
        for point in [INSIDE, OUTSIDE, INSIDE] {
            let evaluation = engine.submit_user_answer(point, &PlanarOracle).unwrap();
            if evaluation.is_correct {
                assert_eq!(engine.points(), previous + 2);
            } else {
                assert_eq!(engine.points(), previous);
            }
            assert!(engine.points() >= previous);
            previous = engine.points();
            engine.request_next_question(&source).await.unwrap();
        }
        assert_eq!(engine.points(), 4);
    }

    #[tokio::test]
    async fn feedback_region_is_the_buffered_geometry() {
        let source = deck(vec![record("Q1", "A1"), record("Q2", "A2")]);
        let mut engine = playing_engine(&source).await;
        let expected = PlanarOracle.buffer(&square(), FEEDBACK_BUFFER_DISTANCE);

        engine.submit_user_answer(INSIDE, &PlanarOracle).unwrap();
        assert_eq!(engine.overlays().unwrap().correct().regions(), &[expected.clone()]);

        engine.request_next_question(&source).await.unwrap();
        engine.submit_user_answer(OUTSIDE, &PlanarOracle).unwrap();
        // Same buffered shape regardless of correctness, and the history of
        // the first answer is still there.
        assert_eq!(engine.overlays().unwrap().incorrect().regions(), &[expected]);
        assert_eq!(engine.overlays().unwrap().correct().len(), 1);
    }

    #[tokio::test]
    async fn phases_cycle_through_the_round() {
        let source = deck(vec![record("Q1", "A1"), record("Q2", "A2")]);
        let mut engine = QuizEngine::new(source.len());
        assert_eq!(engine.phase(), GamePhase::ChoosingDifficulty);

        engine.advance_question(&source).await.unwrap();
        assert_eq!(engine.phase(), GamePhase::ChoosingDifficulty);

        engine.start().unwrap();
        assert_eq!(engine.phase(), GamePhase::Playing);

        engine.submit_user_answer(OUTSIDE, &PlanarOracle).unwrap();
        assert_eq!(engine.phase(), GamePhase::AnswerSubmitted);

        engine.request_next_question(&source).await.unwrap();
        assert_eq!(engine.phase(), GamePhase::Playing);
    }

    #[tokio::test]
    async fn start_is_only_valid_before_play() {
        let source = single_question_deck();
        let mut engine = playing_engine(&source).await;

        let err = engine.start().unwrap_err();
        assert!(matches!(
            err,
            GameError::WrongPhase {
                expected: GamePhase::ChoosingDifficulty,
                found: GamePhase::Playing,
            }
        ));
    }

    #[test]
    fn submitting_outside_play_is_rejected() {
        let mut engine = QuizEngine::new(1);
        let err = engine.submit_user_answer(INSIDE, &PlanarOracle).unwrap_err();
        assert!(matches!(err, GameError::WrongPhase { .. }));
        assert!(engine.overlays().is_none());
    }

    #[test]
    fn submitting_with_no_question_is_rejected() {
        let mut engine = QuizEngine::new(0);
        engine.start().unwrap();
        let err = engine.submit_user_answer(INSIDE, &PlanarOracle).unwrap_err();
        assert!(matches!(err, GameError::NoActiveQuestion));
        assert_eq!(engine.phase(), GamePhase::Playing);
    }

    #[tokio::test]
    async fn advancing_past_the_end_changes_nothing() {
        let source = single_question_deck();
        let mut engine = playing_engine(&source).await;
        let question = engine.current_question().cloned();
        assert!(engine.cursor().is_exhausted());

        for expected_index in 1..4 {
            engine.advance_question(&source).await.unwrap();
            assert_eq!(engine.cursor().index, expected_index);
            assert_eq!(engine.current_question().cloned(), question);
            let events = engine.take_events();
            assert!(!events.contains(&EngineEvent::NewQuestion));
        }
    }

    #[tokio::test]
    async fn empty_deck_advances_the_cursor_only() {
        let source = deck(vec![]);
        let mut engine = QuizEngine::new(source.len());

        engine.advance_question(&source).await.unwrap();
        assert_eq!(engine.cursor().index, 0);
        assert!(engine.current_question().is_none());
        assert!(!engine.take_events().contains(&EngineEvent::NewQuestion));
    }

    #[tokio::test]
    async fn missing_attribute_still_burns_the_cursor() {
        let source = deck(vec![QuestionRecord {
            question: Some("Where is the Mariana Trench?".to_string()),
            answer: None,
            geometry: square(),
        }]);
        let mut engine = QuizEngine::new(source.len());

        let err = engine.advance_question(&source).await.unwrap_err();
        assert!(matches!(
            err,
            GameError::MissingAttribute { index: 0, field: "answer" }
        ));
        assert_eq!(engine.cursor().index, 0);
        assert!(engine.current_question().is_none());
        assert!(!engine.take_events().contains(&EngineEvent::NewQuestion));
    }

    #[tokio::test]
    async fn overlays_appear_on_first_submission_only() {
        let source = deck(vec![record("Q1", "A1"), record("Q2", "A2")]);
        let mut engine = playing_engine(&source).await;
        assert!(engine.overlays().is_none());

        engine.submit_user_answer(INSIDE, &PlanarOracle).unwrap();
        assert!(engine.overlays().is_some());

        engine.request_next_question(&source).await.unwrap();
        engine.submit_user_answer(INSIDE, &PlanarOracle).unwrap();
        // Still the same pair of collections, now with more history.
        assert_eq!(engine.overlays().unwrap().correct().len(), 2);
    }

    #[tokio::test]
    async fn events_report_the_round() {
        let source = single_question_deck();
        let mut engine = QuizEngine::new(source.len());

        engine.set_difficulty(Difficulty::Hard);
        engine.advance_question(&source).await.unwrap();
        engine.start().unwrap();

        let events = engine.take_events();
        assert!(events.contains(&EngineEvent::DifficultyChanged(Difficulty::Hard)));
        assert!(events.contains(&EngineEvent::CursorMoved(0)));
        assert!(events.contains(&EngineEvent::NewQuestion));
        assert!(events.contains(&EngineEvent::PhaseChanged(GamePhase::Playing)));

        engine.submit_user_answer(INSIDE, &PlanarOracle).unwrap();
        let events = engine.take_events();
        assert!(events.contains(&EngineEvent::ScoreChanged(3)));
        assert!(events.contains(&EngineEvent::AnswerEvaluated { is_correct: true }));
        assert!(events.contains(&EngineEvent::PhaseChanged(GamePhase::AnswerSubmitted)));

        // Drained means drained.
        assert!(engine.take_events().is_empty());
    }

    #[tokio::test]
    async fn last_evaluation_tracks_the_latest_answer() {
        let source = deck(vec![record("Q1", "A1"), record("Q2", "A2")]);
        let mut engine = playing_engine(&source).await;
        assert!(engine.last_evaluation().is_none());

        engine.submit_user_answer(INSIDE, &PlanarOracle).unwrap();
        assert!(engine.last_evaluation().unwrap().is_correct);

        engine.request_next_question(&source).await.unwrap();
        engine.submit_user_answer(OUTSIDE, &PlanarOracle).unwrap();
        let evaluation = engine.last_evaluation().unwrap();
        assert!(!evaluation.is_correct);
        assert_eq!(evaluation.submitted_point, OUTSIDE);
    }
}
