//! Data model for branching questionnaires.
//!
//! Questions are nodes, options are typed edges, answers record which edge
//! a respondent took. A [`Questionnaire`] freezes an ordered set of
//! questions and stamps it with a tamper-evidence hash; the walking itself
//! lives in `questionnaire-fsm`.

pub mod answer;
pub mod common;
pub mod error;
pub mod option;
pub mod ordered_map;
pub mod question;
pub mod questionnaire;
pub mod state;
pub mod value;

pub use answer::{Answer, AnswerMap};
pub use error::{HookError, QuestionnaireError};
pub use option::{AnswerHook, AnswerSnapshot, NextQuestion, QuestionOption};
pub use ordered_map::OrderedMap;
pub use question::{Question, QuestionBuilder, QuestionMeta, QuestionType};
pub use questionnaire::Questionnaire;
pub use state::State;
pub use value::{OptionValue, ValueKind};
