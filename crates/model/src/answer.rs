use serde::{Deserialize, Serialize};

use crate::common::now_rfc3339;
use crate::error::QuestionnaireError;
use crate::option::{AnswerSnapshot, QuestionOption};
use crate::ordered_map::OrderedMap;
use crate::question::Question;
use crate::value::OptionValue;

/// Answers of one session keyed by question id, in the order they were
/// first given.
pub type AnswerMap = OrderedMap<Answer>;

/// The option chosen for a question, with both captured as they were when
/// the answer was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Always the answered question's id: one answer per question.
    pub id: String,
    pub question: Question,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<QuestionOption>,
    pub answered_at: String,
}

impl Answer {
    pub fn new(
        question: Question,
        option: Option<QuestionOption>,
    ) -> Result<Self, QuestionnaireError> {
        match &option {
            None if question.meta.required => {
                return Err(QuestionnaireError::AnswerOptionRequired {
                    question_id: question.id,
                });
            }
            Some(option) => question.check_option(option)?,
            None => {}
        }

        Ok(Self {
            id: question.id.clone(),
            question,
            option,
            answered_at: now_rfc3339(),
        })
    }

    pub fn question_id(&self) -> &str {
        &self.question.id
    }

    pub fn value(&self) -> Option<&OptionValue> {
        self.option.as_ref().map(|o| &o.value)
    }

    /// Flattened view handed to answer hooks; `None` for a skipped answer.
    pub fn snapshot(&self) -> Option<AnswerSnapshot> {
        let option = self.option.as_ref()?;
        Some(AnswerSnapshot {
            answer_id: self.id.clone(),
            question_id: self.question.id.clone(),
            question_label: self.question.label.clone(),
            question_weight: self.question.meta.weight,
            option_id: option.id.clone(),
            option_label: option.label.clone(),
            option_value: option.value.clone(),
            option_weight: option.weight,
        })
    }
}
