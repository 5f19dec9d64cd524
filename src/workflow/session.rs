use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use linguaflow_common::{Purpose, Stage};

/// A persisted session field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionField {
    SourceText,
    TargetText,
    TargetAudience,
    Context,
    TextPurpose,
    Stage,
    BackgroundSummary,
    LaymanLogic,
    /// Server credential. Survives a session reset.
    Passphrase,
}

impl SessionField {
    /// Fields erased by a session reset.
    pub const SESSION: [SessionField; 8] = [
        SessionField::SourceText,
        SessionField::TargetText,
        SessionField::TargetAudience,
        SessionField::Context,
        SessionField::TextPurpose,
        SessionField::Stage,
        SessionField::BackgroundSummary,
        SessionField::LaymanLogic,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SessionField::SourceText => "source_text",
            SessionField::TargetText => "target_text",
            SessionField::TargetAudience => "target_audience",
            SessionField::Context => "context",
            SessionField::TextPurpose => "text_purpose",
            SessionField::Stage => "stage",
            SessionField::BackgroundSummary => "background_summary",
            SessionField::LaymanLogic => "layman_logic",
            SessionField::Passphrase => "passphrase",
        }
    }
}

/// Raw field values as read from a [`super::SessionStore`].
pub type StoredFields = BTreeMap<SessionField, String>;

/// The single active workflow session.
///
/// Owned by [`super::WorkflowController`] and mutated only through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub source_text: String,
    /// The artifact currently shown to (and editable by) the user
    pub target_text: String,
    pub global_context: String,
    pub target_audience: String,
    pub text_purpose: Option<Purpose>,
    pub stage: Stage,
    pub background_summary: String,
    pub layman_logic: String,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            source_text: String::new(),
            target_text: String::new(),
            global_context: String::new(),
            target_audience: String::new(),
            text_purpose: Some(Purpose::default()),
            stage: Stage::Idle,
            background_summary: String::new(),
            layman_logic: String::new(),
            is_loading: false,
            last_error: None,
        }
    }
}

impl Session {
    /// Rebuild a session from persisted fields. Unknown or unparsable
    /// values fall back to defaults.
    pub fn from_stored(fields: &StoredFields) -> Self {
        let text = |field: SessionField| fields.get(&field).cloned().unwrap_or_default();
        let mut session = Session {
            source_text: text(SessionField::SourceText),
            target_text: text(SessionField::TargetText),
            global_context: text(SessionField::Context),
            target_audience: text(SessionField::TargetAudience),
            background_summary: text(SessionField::BackgroundSummary),
            layman_logic: text(SessionField::LaymanLogic),
            ..Session::default()
        };
        if let Some(raw) = fields.get(&SessionField::TextPurpose) {
            session.text_purpose = Purpose::from_str(raw).ok();
        }
        if let Some(stage) = fields
            .get(&SessionField::Stage)
            .and_then(|raw| Stage::from_str(raw).ok())
        {
            session.stage = stage;
        }
        session
    }

    pub fn audience(&self) -> Option<&str> {
        non_blank(&self.target_audience)
    }

    pub fn context(&self) -> Option<&str> {
        non_blank(&self.global_context)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    if value.trim().is_empty() { None } else { Some(value) }
}

/// A batch of user edits applied between generation steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEdits {
    #[serde(default)]
    pub source_text: Option<String>,
    #[serde(default)]
    pub target_text: Option<String>,
    #[serde(default, alias = "targetAudience")]
    pub audience: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    /// `Some(None)` clears the purpose.
    #[serde(default, with = "purpose_edit")]
    pub purpose: Option<Option<Purpose>>,
}

impl SessionEdits {
    pub fn is_empty(&self) -> bool {
        self.source_text.is_none()
            && self.target_text.is_none()
            && self.audience.is_none()
            && self.context.is_none()
            && self.purpose.is_none()
    }
}

mod purpose_edit {
    //! Distinguishes an absent `purpose` key from an explicit `null`.

    use linguaflow_common::Purpose;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Option<Purpose>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<Purpose>>, D::Error> {
        Option::<Purpose>::deserialize(deserializer).map(Some)
    }
}
