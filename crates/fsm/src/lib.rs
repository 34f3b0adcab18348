//! Questionnaire walker -- one finite state machine per respondent.
//!
//! A machine is built over a [`Questionnaire`] from `questionnaire-model`,
//! moves with `start`, `forward`, `backward` and `jump`, and emits a full
//! [`Event`] snapshot on every transition. Events go to the machine's
//! [`Journal`] and to an [`EventSink`]; any emitted event can later be fed
//! back through `load` to resume the session.
//!
//! Transition counters live in a caller-owned [`MetricsRegistry`].

pub mod config;
pub mod event;
pub mod fsm;
pub mod metrics;

pub use config::FsmConfig;
pub use event::{Event, EventSink, Journal, JsonLinesSink};
pub use fsm::FiniteStateMachine;
pub use metrics::{counter_name, Counter, MetricsRegistry, Transition};

pub use questionnaire_model::{
    Answer, AnswerMap, AnswerSnapshot, OptionValue, Question, QuestionOption, QuestionType,
    Questionnaire, QuestionnaireError, State, ValueKind,
};
