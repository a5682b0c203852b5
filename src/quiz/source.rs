use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::Geometry;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read question deck: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse question deck: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question index {index} is out of bounds for a deck of {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// One row of a question deck. The deck format allows null attributes, so
/// `question` and `answer` only become trusted once the engine builds a
/// [`crate::quiz::Question`] out of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    pub geometry: Geometry,
}

/// A finite, index-addressable deck of question records. `fetch` is where a
/// lazy backend resolves deferred attributes, so it may suspend.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Number of records. Fixed once the source is built.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn fetch(&self, index: usize) -> Result<QuestionRecord, SourceError>;
}

/// Deck parsed from a JSON file on startup.
#[derive(Debug)]
pub struct FileQuestionSource {
    records: Vec<QuestionRecord>,
}

impl FileQuestionSource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let records = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self { records })
    }
}

#[async_trait]
impl QuestionSource for FileQuestionSource {
    fn len(&self) -> usize {
        self.records.len()
    }

    async fn fetch(&self, index: usize) -> Result<QuestionRecord, SourceError> {
        self.records
            .get(index)
            .cloned()
            .ok_or(SourceError::IndexOutOfBounds {
                index,
                len: self.records.len(),
            })
    }
}

/// Deck held in memory, used for the built-in starter questions and tests.
pub struct MemoryQuestionSource {
    records: Vec<QuestionRecord>,
}

impl MemoryQuestionSource {
    pub fn new(records: Vec<QuestionRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl QuestionSource for MemoryQuestionSource {
    fn len(&self) -> usize {
        self.records.len()
    }

    async fn fetch(&self, index: usize) -> Result<QuestionRecord, SourceError> {
        self.records
            .get(index)
            .cloned()
            .ok_or(SourceError::IndexOutOfBounds {
                index,
                len: self.records.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::geometry::{Point, Polygon};
    use std::fs;

    const DECK_JSON: &str = r#"[
        {
            "question": "Where is the Eiffel Tower?",
            "answer": "Paris, France",
            "geometry": { "polygon": { "exterior": [
                { "x": 2.2, "y": 48.8 },
                { "x": 2.5, "y": 48.8 },
                { "x": 2.5, "y": 48.9 },
                { "x": 2.2, "y": 48.9 }
            ] } }
        },
        {
            "geometry": { "point": { "x": 0.0, "y": 0.0 } }
        }
    ]"#;

    #[tokio::test]
    async fn parses_a_deck_file() {
        let path = std::env::temp_dir().join("geotrivia-deck-test.json");
        fs::write(&path, DECK_JSON).unwrap();

        let deck = FileQuestionSource::from_path(&path).unwrap();
        assert_eq!(deck.len(), 2);

        let record = deck.fetch(0).await.unwrap();
        assert_eq!(record.question.as_deref(), Some("Where is the Eiffel Tower?"));
        assert_eq!(record.answer.as_deref(), Some("Paris, France"));
        assert!(matches!(record.geometry, Geometry::Polygon(_)));

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn absent_attributes_parse_as_none() {
        let records: Vec<QuestionRecord> = serde_json::from_str(DECK_JSON).unwrap();
        assert_eq!(records[1].question, None);
        assert_eq!(records[1].answer, None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = FileQuestionSource::from_path("no-such-deck.json").unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[tokio::test]
    async fn fetch_past_the_deck_fails() {
        let deck = MemoryQuestionSource::new(vec![QuestionRecord {
            question: Some("Where is Null Island?".into()),
            answer: Some("The Gulf of Guinea".into()),
            geometry: Geometry::Polygon(Polygon::new(vec![
                Point::new(-1.0, -1.0),
                Point::new(1.0, -1.0),
                Point::new(1.0, 1.0),
                Point::new(-1.0, 1.0),
            ])),
        }]);

        assert!(deck.fetch(0).await.is_ok());
        let err = deck.fetch(1).await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::IndexOutOfBounds { index: 1, len: 1 }
        ));
    }
}
