pub mod ai_helper;
pub mod difficulty;
pub mod engine;
pub mod geometry;
pub mod overlay;
pub mod source;

use serde::{Deserialize, Serialize};

use self::geometry::{Geometry, Point};

/// A single trivia question. The engine swaps the whole value on every
/// advance; a current question is never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub answer_text: String,
    pub geometry: Geometry,
}

impl Question {
    pub fn new(prompt: String, answer_text: String, geometry: Geometry) -> Self {
        Self {
            prompt,
            answer_text,
            geometry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    ChoosingDifficulty,
    Playing,
    AnswerSubmitted,
}

/// Outcome of one submitted answer point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvaluation {
    pub is_correct: bool,
    pub submitted_point: Point,
}
