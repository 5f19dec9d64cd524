use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Position in the insight → deconstruction → reconstruction workflow.
///
/// Ordered: a session only ever moves one step forward at a time, and back
/// to `Idle` only through an explicit reset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Idle,
    InsightDone,
    Deconstructed,
    Reconstructed,
}

impl Stage {
    /// The stage reached by a successful advance, or `None` at the end.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::InsightDone),
            Stage::InsightDone => Some(Stage::Deconstructed),
            Stage::Deconstructed => Some(Stage::Reconstructed),
            Stage::Reconstructed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Zero-based step number, as shown in progress displays.
    pub fn step(self) -> u8 {
        match self {
            Stage::Idle => 0,
            Stage::InsightDone => 1,
            Stage::Deconstructed => 2,
            Stage::Reconstructed => 3,
        }
    }

    /// What the next `advance` will produce.
    pub fn next_action(self) -> &'static str {
        match self {
            Stage::Idle => "Passage insight",
            Stage::InsightDone => "Layman's logic",
            Stage::Deconstructed => "Final reconstruction",
            Stage::Reconstructed => "Complete",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Idle => write!(f, "IDLE"),
            Stage::InsightDone => write!(f, "INSIGHT_DONE"),
            Stage::Deconstructed => write!(f, "DECONSTRUCTED"),
            Stage::Reconstructed => write!(f, "RECONSTRUCTED"),
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IDLE" => Ok(Stage::Idle),
            "INSIGHT_DONE" => Ok(Stage::InsightDone),
            "DECONSTRUCTED" => Ok(Stage::Deconstructed),
            "RECONSTRUCTED" => Ok(Stage::Reconstructed),
            _ => Err(ParseError::Stage(s.to_string())),
        }
    }
}
