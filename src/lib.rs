pub mod config;
pub mod context;
pub mod debounce;
pub mod errors;
pub mod generation;
pub mod prompt;
pub mod remote;
pub mod server;
pub mod workflow;

pub use linguaflow_common::{
    GenerationRequest, GenerationResult, Mode, ModelTier, Purpose, Stage,
};

/// Personas offered as quick picks for the target audience.
pub const AUDIENCE_SUGGESTIONS: [&str; 7] = [
    "General Public",
    "Legal Professionals",
    "Academic Researchers",
    "Business Executives",
    "Tech Developers",
    "Marketing Specialists",
    "Literary Critics",
];
