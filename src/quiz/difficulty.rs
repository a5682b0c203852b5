use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// Basemap the presentation layer should show for a difficulty. The game
/// logic only picks one; what it looks like is up to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasemapStyle {
    ImageryWithLabels,
    LightGrayCanvas,
    Imagery,
}

impl Difficulty {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Easy" => Some(Self::Easy),
            "Medium" => Some(Self::Medium),
            "Hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    /// Points awarded for a correct answer at this difficulty.
    pub fn multiplier(self) -> u32 {
        match self {
            Self::Easy => 1,
            Self::Medium => 2,
            Self::Hard => 3,
        }
    }

    pub fn basemap(self) -> BasemapStyle {
        match self {
            Self::Easy => BasemapStyle::ImageryWithLabels,
            Self::Medium => BasemapStyle::LightGrayCanvas,
            Self::Hard => BasemapStyle::Imagery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipliers_follow_difficulty() {
        assert_eq!(Difficulty::Easy.multiplier(), 1);
        assert_eq!(Difficulty::Medium.multiplier(), 2);
        assert_eq!(Difficulty::Hard.multiplier(), 3);
    }

    #[test]
    fn labels_round_trip() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(Difficulty::from_label(difficulty.label()), Some(difficulty));
        }
        assert_eq!(Difficulty::from_label("Impossible"), None);
        assert_eq!(Difficulty::from_label("easy"), None);
    }

    #[test]
    fn each_difficulty_has_its_basemap() {
        assert_eq!(Difficulty::Easy.basemap(), BasemapStyle::ImageryWithLabels);
        assert_eq!(Difficulty::Medium.basemap(), BasemapStyle::LightGrayCanvas);
        assert_eq!(Difficulty::Hard.basemap(), BasemapStyle::Imagery);
    }
}
