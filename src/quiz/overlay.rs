use serde::{Deserialize, Serialize};

use super::geometry::Geometry;

const FEEDBACK_ALPHA: u8 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid,
    Dash,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlineSymbol {
    pub style: LineStyle,
    pub color: Color,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillSymbol {
    pub color: Color,
    pub outline: OutlineSymbol,
}

/// One append-only collection of feedback regions with its fixed symbol.
/// Regions are never removed or edited once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackOverlay {
    symbol: FillSymbol,
    regions: Vec<Geometry>,
}

impl FeedbackOverlay {
    fn new(symbol: FillSymbol) -> Self {
        Self {
            symbol,
            regions: Vec::new(),
        }
    }

    fn push(&mut self, region: Geometry) {
        self.regions.push(region);
    }

    pub fn symbol(&self) -> &FillSymbol {
        &self.symbol
    }

    pub fn regions(&self) -> &[Geometry] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// The running history of every answered question in the session: green for
/// hits, red for misses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackOverlays {
    correct: FeedbackOverlay,
    incorrect: FeedbackOverlay,
}

impl FeedbackOverlays {
    pub fn new() -> Self {
        let outline = OutlineSymbol {
            style: LineStyle::Dash,
            color: Color::argb(255, 255, 255, 255),
            width: 5.0,
        };
        Self {
            correct: FeedbackOverlay::new(FillSymbol {
                color: Color::argb(FEEDBACK_ALPHA, 0, 255, 128),
                outline,
            }),
            incorrect: FeedbackOverlay::new(FillSymbol {
                color: Color::argb(FEEDBACK_ALPHA, 255, 0, 0),
                outline,
            }),
        }
    }

    pub fn record(&mut self, region: Geometry, is_correct: bool) {
        if is_correct {
            self.correct.push(region);
        } else {
            self.incorrect.push(region);
        }
    }

    pub fn correct(&self) -> &FeedbackOverlay {
        &self.correct
    }

    pub fn incorrect(&self) -> &FeedbackOverlay {
        &self.incorrect
    }
}

impl Default for FeedbackOverlays {
    fn default() -> Self {
        Self::new()
    }
}
