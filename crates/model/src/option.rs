//! Options: the typed edges leaving a question.
//!
//! An option carries a value, a weight, and routing: a fixed next question
//! id, a resolver closure evaluated when the option is chosen, or neither,
//! in which case it must carry a terminal state. Closures are never
//! serialized; only a fixed (or already resolved) next id is.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::answer::AnswerMap;
use crate::common::new_id;
use crate::error::{HookError, QuestionnaireError};
use crate::state::State;
use crate::value::OptionValue;

/// Resolver deciding the next question id from the answers recorded so far
/// (including the one being recorded).
pub type NextQuestionFn = dyn Fn(&AnswerMap) -> Option<String> + Send + Sync;

/// Hook invoked synchronously after an option is chosen.
pub type AnswerHookFn = dyn Fn(&AnswerSnapshot) -> Result<(), HookError> + Send + Sync;

/// Where a chosen option leads.
#[derive(Clone)]
pub enum NextQuestion {
    Id(String),
    Resolver(Arc<NextQuestionFn>),
}

impl NextQuestion {
    pub fn resolve(&self, answers: &AnswerMap) -> Option<String> {
        match self {
            NextQuestion::Id(id) => Some(id.clone()),
            NextQuestion::Resolver(f) => f(answers),
        }
    }
}

impl fmt::Debug for NextQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextQuestion::Id(id) => f.debug_tuple("Id").field(id).finish(),
            NextQuestion::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

impl PartialEq for NextQuestion {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NextQuestion::Id(a), NextQuestion::Id(b)) => a == b,
            (NextQuestion::Resolver(a), NextQuestion::Resolver(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Flattened view of an answer handed to [`AnswerHook`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerSnapshot {
    pub answer_id: String,
    pub question_id: String,
    pub question_label: String,
    pub question_weight: i64,
    pub option_id: String,
    pub option_label: String,
    pub option_value: OptionValue,
    pub option_weight: i64,
}

#[derive(Clone)]
pub struct AnswerHook(Arc<AnswerHookFn>);

impl AnswerHook {
    pub fn call(&self, snapshot: &AnswerSnapshot) -> Result<(), HookError> {
        (self.0)(snapshot)
    }
}

impl fmt::Debug for AnswerHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnswerHook(..)")
    }
}

// ──────────────────────────────────────────────
// Option
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub label: String,
    pub value: OptionValue,
    pub weight: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Terminal-state override; `None` means the option imposes no state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(
        rename = "next_question_id",
        default,
        skip_serializing_if = "has_no_fixed_target",
        with = "next_question_id"
    )]
    next: Option<NextQuestion>,
    #[serde(skip)]
    hook: Option<AnswerHook>,
}

fn has_no_fixed_target(next: &Option<NextQuestion>) -> bool {
    !matches!(next, Some(NextQuestion::Id(_)))
}

mod next_question_id {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::NextQuestion;

    pub fn serialize<S: Serializer>(
        next: &Option<NextQuestion>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match next {
            Some(NextQuestion::Id(id)) => serializer.serialize_some(id),
            _ => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NextQuestion>, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.map(NextQuestion::Id))
    }
}

impl QuestionOption {
    /// New option with a generated id, weight 1, no routing, and the value's
    /// display form as label.
    pub fn new(value: impl Into<OptionValue>) -> Self {
        let value = value.into();
        Self {
            id: new_id(),
            label: value.to_string(),
            value,
            weight: 1,
            group: None,
            image_url: None,
            state: None,
            next: None,
            hook: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_next_question_id(mut self, id: impl Into<String>) -> Self {
        self.next = Some(NextQuestion::Id(id.into()));
        self
    }

    pub fn with_next_question_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&AnswerMap) -> Option<String> + Send + Sync + 'static,
    {
        self.next = Some(NextQuestion::Resolver(Arc::new(f)));
        self
    }

    pub fn with_answer_hook<F>(mut self, f: F) -> Self
    where
        F: Fn(&AnswerSnapshot) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.hook = Some(AnswerHook(Arc::new(f)));
        self
    }

    pub fn next_question(&self) -> Option<&NextQuestion> {
        self.next.as_ref()
    }

    /// Fixed next question id, if the option routes statically.
    pub fn next_question_id(&self) -> Option<&str> {
        match &self.next {
            Some(NextQuestion::Id(id)) => Some(id),
            _ => None,
        }
    }

    pub fn resolve_next_question(&self, answers: &AnswerMap) -> Option<String> {
        self.next.as_ref().and_then(|n| n.resolve(answers))
    }

    pub fn hook(&self) -> Option<&AnswerHook> {
        self.hook.as_ref()
    }

    /// Copy of this option as it is recorded in an answer: routing frozen to
    /// the resolved id, hook dropped.
    pub fn resolved(&self, next_question_id: Option<String>) -> Self {
        Self {
            next: next_question_id.map(NextQuestion::Id),
            hook: None,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), QuestionnaireError> {
        if self.id.trim().is_empty() {
            return Err(QuestionnaireError::validation("option", "id must not be empty"));
        }
        if let Some(NextQuestion::Id(id)) = &self.next {
            if id.trim().is_empty() {
                return Err(QuestionnaireError::validation(
                    "option",
                    format!("option {} has an empty next question id", self.id),
                ));
            }
        }
        Ok(())
    }
}

impl PartialEq for QuestionOption {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.label == other.label
            && self.value == other.value
            && self.weight == other.weight
            && self.group == other.group
            && self.image_url == other.image_url
            && self.state == other.state
            && self.next == other.next
    }
}
