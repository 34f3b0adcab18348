//! Events, the journal, and where events go.
//!
//! An [`Event`] is a full snapshot of a machine after a transition: it
//! embeds the questionnaire and every answer, so it is both the record to
//! persist and enough to resume a session with `load`.

use std::io::Write;

use serde::{Deserialize, Serialize};

use questionnaire_model::{Answer, AnswerMap, Question, Questionnaire, QuestionnaireError, State};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Per-session position; a machine resumed with `load` continues after
    /// the loaded event.
    pub sequence: u64,
    pub emitted_at: String,
    pub user_id: String,
    pub state: State,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_question: Option<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_question: Option<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_answer: Option<Answer>,
    pub current_question_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_question_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_question_id: Option<String>,
    pub total_answers: usize,
    pub total_questions: usize,
    pub answers: AnswerMap,
    pub questionnaire: Questionnaire,
}

impl Event {
    pub fn to_json(&self) -> Result<String, QuestionnaireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, QuestionnaireError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Append-only history of the events one machine emitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Journal {
    events: Vec<Event>,
}

impl Journal {
    pub(crate) fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn to_json(&self) -> Result<String, QuestionnaireError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<'a> IntoIterator for &'a Journal {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Receives every event a machine emits, synchronously, after the event
/// has been appended to the journal.
///
/// Implemented for any `FnMut(&Event, &Journal) + Send` closure.
pub trait EventSink: Send {
    fn on_event(&mut self, event: &Event, journal: &Journal);
}

impl<F> EventSink for F
where
    F: FnMut(&Event, &Journal) + Send,
{
    fn on_event(&mut self, event: &Event, journal: &Journal) {
        self(event, journal)
    }
}

/// Writes each event as one line of JSON.
///
/// Write failures cannot abort the transition that produced the event, so
/// they are logged and counted instead.
pub struct JsonLinesSink<W> {
    writer: W,
    failures: u64,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failures: 0,
        }
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_event(&mut self, event: &Event) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn on_event(&mut self, event: &Event, _journal: &Journal) {
        if let Err(e) = self.write_event(event) {
            self.failures += 1;
            tracing::warn!(
                user_id = %event.user_id,
                sequence = event.sequence,
                err = %e,
                "failed to write event"
            );
        }
    }
}
