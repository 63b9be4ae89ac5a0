//! Immutable quiz snapshots.
//!
//! A room captures a [`QuizSnapshot`] at creation time and plays it
//! unchanged for the whole session; edits to the source quiz never
//! affect a running room. Snapshots are validated once on intake and
//! shared between rooms behind an [`std::sync::Arc`].

use std::{sync::Arc, time::Duration};

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay, serde_as};
use uuid::Uuid;

type ValidationResult = garde::Result;

/// Validates that a duration falls within specified bounds
///
/// Timing parameters for questions must fall within the ranges defined
/// by the crate constants.
fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    field: &'static str,
    val: &Duration,
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "{field} is outside of the bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Validates the answering time limit of a question
fn validate_time_limit(val: &Duration) -> ValidationResult {
    validate_duration::<
        { crate::constants::quiz::MIN_TIME_LIMIT },
        { crate::constants::quiz::MAX_TIME_LIMIT },
    >("time_limit", val)
}

/// Validates that a question has at least one choice marked correct
fn validate_has_correct_choice(val: &[Choice]) -> ValidationResult {
    if val.iter().any(|choice| choice.correct) {
        Ok(())
    } else {
        Err(garde::Error::new("question has no correct choice"))
    }
}

/// A unique identifier for answer choices
///
/// Choice ids are minted when the snapshot is taken and referenced by
/// players' answer submissions.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct ChoiceId(Uuid);

impl ChoiceId {
    /// Creates a new random choice ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChoiceId {
    /// Creates a new random choice ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ChoiceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// One selectable answer option, including its correctness marker.
///
/// The marker never leaves the crate boundary before the question
/// closes; clients see [`PublicChoice`] instead.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Choice {
    /// Identifier referenced by answer submissions
    #[garde(skip)]
    #[serde(default = "ChoiceId::new")]
    pub id: ChoiceId,
    /// Display text of the choice
    #[garde(length(max = crate::constants::quiz::MAX_TEXT_LENGTH))]
    pub text: String,
    /// Whether selecting this choice scores points
    #[garde(skip)]
    pub correct: bool,
}

/// One timed question of a quiz.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Question {
    /// The question prompt shown to everyone
    #[garde(length(max = crate::constants::quiz::MAX_TEXT_LENGTH))]
    pub text: String,
    /// How long the question stays open for answers
    #[garde(custom(|v, _| validate_time_limit(v)))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub time_limit: Duration,
    /// Maximum points awarded for an instantaneous correct answer
    #[garde(range(min = 1))]
    pub point_budget: u64,
    /// The selectable options, at least one of them correct
    #[garde(
        length(
            min = crate::constants::quiz::MIN_CHOICE_COUNT,
            max = crate::constants::quiz::MAX_CHOICE_COUNT
        ),
        custom(|v, _| validate_has_correct_choice(v)),
        dive
    )]
    pub choices: Vec<Choice>,
}

impl Question {
    /// Looks up a choice of this question by id.
    pub fn choice(&self, id: ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.id == id)
    }

    /// Returns the id of the first correct choice.
    ///
    /// Validation guarantees at least one correct choice, so this is
    /// only `None` for snapshots that bypassed validation.
    pub fn correct_choice_id(&self) -> Option<ChoiceId> {
        self.choices
            .iter()
            .find(|choice| choice.correct)
            .map(|choice| choice.id)
    }

    /// Returns the choices with the correctness markers stripped,
    /// safe to send to players while the question is open.
    pub fn public_choices(&self) -> Vec<PublicChoice> {
        self.choices
            .iter()
            .map(|choice| PublicChoice {
                id: choice.id,
                text: choice.text.clone(),
            })
            .collect()
    }
}

/// A choice as shown to players: no correctness marker.
#[derive(Debug, Clone, Serialize)]
pub struct PublicChoice {
    /// Identifier to submit back in an answer
    pub id: ChoiceId,
    /// Display text of the choice
    pub text: String,
}

/// The payload of an outbound `question` message.
#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct QuestionPayload {
    /// Zero-based index of the question within the quiz
    pub question_index: usize,
    /// The question prompt
    pub question_text: String,
    /// Selectable options without correctness markers
    pub choices: Vec<PublicChoice>,
    /// Seconds the question stays open
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub time_limit: Duration,
}

/// A complete quiz captured for one session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizSnapshot {
    /// Title announced when the game starts
    #[garde(length(max = crate::constants::quiz::MAX_TITLE_LENGTH))]
    pub title: String,
    /// The ordered questions to play through
    #[garde(
        length(min = 1, max = crate::constants::quiz::MAX_QUESTION_COUNT),
        dive
    )]
    pub questions: Vec<Question>,
}

impl QuizSnapshot {
    /// Number of questions in the quiz.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the quiz has no questions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Looks up a question by index.
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

/// Source of quiz snapshots, implemented by the storage layer.
pub trait QuizSource {
    /// Resolves a quiz id to a validated snapshot, if one exists.
    fn quiz_by_id(&self, id: &str) -> Option<Arc<QuizSnapshot>>;
}
