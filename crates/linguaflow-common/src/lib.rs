//! Shared domain types for LinguaFlow.
//!
//! These types carry no I/O. They are shared by the generation client, the
//! workflow controller, the HTTP server and the remote client, and they
//! define the wire names used on the HTTP surface.

pub mod request;
pub mod stage;

pub use request::{ContextRequest, ContextResponse, GenerationRequest, GenerationResult};
pub use stage::Stage;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to parse one of the closed enums from its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid mode '{0}'. Valid values: TRANSLATOR, PROOFREADER, POLISH, BACKGROUND_SUMMARY, DECONSTRUCT, RECONSTRUCT")]
    Mode(String),

    #[error("Invalid purpose '{0}'. Valid values: INFORMATIVE, EXPRESSIVE, OPERATIVE")]
    Purpose(String),

    #[error("Invalid stage '{0}'")]
    Stage(String),
}

/// Communicative goal of a text (Reiss' text typology).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Purpose {
    /// Facts and knowledge: accuracy and clarity first.
    #[default]
    Informative,
    /// Literature and essays: aesthetics and the author's voice.
    Expressive,
    /// Ads and speeches: persuasion and impact.
    Operative,
}

impl Purpose {
    pub const ALL: [Purpose; 3] = [Purpose::Informative, Purpose::Expressive, Purpose::Operative];

    pub fn label(self) -> &'static str {
        match self {
            Purpose::Informative => "Informative",
            Purpose::Expressive => "Expressive",
            Purpose::Operative => "Operative",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Purpose::Informative => "Focus on content, facts, and clarity (reports, news, manuals)",
            Purpose::Expressive => "Focus on aesthetics, style, and the author's voice (literature, essays)",
            Purpose::Operative => "Focus on persuasion and inducing action (ads, speeches)",
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Purpose::Informative => "INFORMATIVE",
            Purpose::Expressive => "EXPRESSIVE",
            Purpose::Operative => "OPERATIVE",
        }
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl std::str::FromStr for Purpose {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INFORMATIVE" => Ok(Purpose::Informative),
            "EXPRESSIVE" => Ok(Purpose::Expressive),
            "OPERATIVE" => Ok(Purpose::Operative),
            _ => Err(ParseError::Purpose(s.to_string())),
        }
    }
}

/// Which generation pathway a request runs through.
///
/// Adding a variant forces the prompt builder, the tier selection and the
/// workflow controller to handle it: all of them match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Fast, literal bidirectional translation.
    #[serde(rename = "TRANSLATOR")]
    Translate,
    /// Literal draft followed by an idiomatic polish of that draft.
    #[serde(rename = "PROOFREADER")]
    Proofread,
    /// Idiomatic rewrite of an existing draft, same language.
    #[serde(rename = "POLISH")]
    Polish,
    /// Stage 1: passage insight (domain, key terms, pitfalls).
    #[serde(rename = "BACKGROUND_SUMMARY")]
    BackgroundSummary,
    /// Stage 2: plain-language logic in the opposite language.
    #[serde(rename = "DECONSTRUCT")]
    Deconstruct,
    /// Stage 3: final text written only from verified logic.
    #[serde(rename = "RECONSTRUCT")]
    Reconstruct,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Translate,
        Mode::Proofread,
        Mode::Polish,
        Mode::BackgroundSummary,
        Mode::Deconstruct,
        Mode::Reconstruct,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Mode::Translate => "TRANSLATOR",
            Mode::Proofread => "PROOFREADER",
            Mode::Polish => "POLISH",
            Mode::BackgroundSummary => "BACKGROUND_SUMMARY",
            Mode::Deconstruct => "DECONSTRUCT",
            Mode::Reconstruct => "RECONSTRUCT",
        }
    }

    /// Exact wire name only. The lenient [`FromStr`](std::str::FromStr)
    /// impl is for the CLI.
    pub fn from_wire(name: &str) -> Option<Mode> {
        Mode::ALL.into_iter().find(|mode| mode.wire_name() == name)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl std::str::FromStr for Mode {
    type Err = ParseError;

    /// Accepts the wire names plus the short verb forms used on the CLI.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "TRANSLATOR" | "TRANSLATE" => Ok(Mode::Translate),
            "PROOFREADER" | "PROOFREAD" => Ok(Mode::Proofread),
            "POLISH" => Ok(Mode::Polish),
            "BACKGROUND_SUMMARY" => Ok(Mode::BackgroundSummary),
            "DECONSTRUCT" => Ok(Mode::Deconstruct),
            "RECONSTRUCT" => Ok(Mode::Reconstruct),
            _ => Err(ParseError::Mode(s.to_string())),
        }
    }
}

/// Model class a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Low latency, used for literal translation drafts.
    Fast,
    /// Higher quality, used for rewriting, summarising and reconstruction.
    Quality,
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelTier::Fast => write!(f, "fast"),
            ModelTier::Quality => write!(f, "quality"),
        }
    }
}
