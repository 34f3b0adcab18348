//! Questions: the nodes of a questionnaire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuestionnaireError;
use crate::option::QuestionOption;
use crate::ordered_map::OrderedMap;
use crate::value::{OptionValue, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    Text,
    SingleSelect,
    MultipleSelect,
    Logical,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::SingleSelect => "single-select",
            QuestionType::MultipleSelect => "multiple-select",
            QuestionType::Logical => "logical",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = QuestionnaireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(QuestionType::Text),
            "single-select" => Ok(QuestionType::SingleSelect),
            "multiple-select" => Ok(QuestionType::MultipleSelect),
            "logical" => Ok(QuestionType::Logical),
            other => Err(QuestionnaireError::validation(
                "question",
                format!("unknown question type '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionMeta {
    pub required: bool,
    pub weight: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Ordinal position in the questionnaire, assigned at assembly.
    pub index: usize,
}

impl Default for QuestionMeta {
    fn default() -> Self {
        Self {
            required: false,
            weight: 1,
            image_url: None,
            index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Variant every option of this question carries.
    pub value_kind: ValueKind,
    pub options: OrderedMap<QuestionOption>,
    /// The question this one was first reached from. Written once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_question_id: Option<String>,
    pub meta: QuestionMeta,
}

impl Question {
    pub fn builder(
        id: impl Into<String>,
        label: impl Into<String>,
        question_type: QuestionType,
        value_kind: ValueKind,
    ) -> QuestionBuilder {
        QuestionBuilder {
            id: id.into(),
            label: label.into(),
            question_type,
            value_kind,
            meta: QuestionMeta::default(),
            options: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.meta.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.meta.index = index;
    }

    pub fn option(&self, id: &str) -> Option<QuestionOption> {
        self.options.get(id)
    }

    /// Record where this question was first reached from. Later calls are
    /// ignored; returns whether the value was written.
    pub fn set_previous_question_id_once(&mut self, id: &str) -> bool {
        if self.previous_question_id.is_some() {
            return false;
        }
        self.previous_question_id = Some(id.to_string());
        true
    }

    /// Check that `option` carries the variant this question declares.
    pub fn check_option(&self, option: &QuestionOption) -> Result<(), QuestionnaireError> {
        let got = option.value.kind();
        if got != self.value_kind {
            return Err(QuestionnaireError::AnswerOptionType {
                question_id: self.id.clone(),
                expected: self.value_kind.to_string(),
                got: got.to_string(),
            });
        }
        Ok(())
    }

    /// Classify untyped input (e.g. a client payload) against this
    /// question's value kind.
    pub fn classify_value(
        &self,
        value: &serde_json::Value,
    ) -> Result<OptionValue, QuestionnaireError> {
        let mismatch = |got: String| QuestionnaireError::AnswerOptionType {
            question_id: self.id.clone(),
            expected: self.value_kind.to_string(),
            got,
        };
        let classified = OptionValue::from_json(value)
            .ok_or_else(|| mismatch(OptionValue::describe_json(value).to_string()))?;
        let got = classified.kind();
        classified
            .coerce_to(self.value_kind)
            .ok_or_else(|| mismatch(got.to_string()))
    }

    /// First declared option whose value equals `value`.
    pub fn find_option_by_value(&self, value: &OptionValue) -> Option<QuestionOption> {
        self.options.values().into_iter().find(|o| &o.value == value)
    }
}

pub struct QuestionBuilder {
    id: String,
    label: String,
    question_type: QuestionType,
    value_kind: ValueKind,
    meta: QuestionMeta,
    options: Vec<QuestionOption>,
}

impl QuestionBuilder {
    pub fn required(mut self, required: bool) -> Self {
        self.meta.required = required;
        self
    }

    pub fn weight(mut self, weight: i64) -> Self {
        self.meta.weight = weight;
        self
    }

    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.meta.image_url = Some(url.into());
        self
    }

    pub fn option(mut self, option: QuestionOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = QuestionOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn build(self) -> Result<Question, QuestionnaireError> {
        if self.id.trim().is_empty() {
            return Err(QuestionnaireError::validation("question", "id must not be empty"));
        }
        if self.label.trim().is_empty() {
            return Err(QuestionnaireError::validation(
                "question",
                format!("question {} has an empty label", self.id),
            ));
        }

        let question = Question {
            id: self.id,
            label: self.label,
            question_type: self.question_type,
            value_kind: self.value_kind,
            options: OrderedMap::new(),
            previous_question_id: None,
            meta: self.meta,
        };

        for option in self.options {
            option.validate()?;
            question.check_option(&option)?;
            if question.options.contains_key(&option.id) {
                return Err(QuestionnaireError::validation(
                    "question",
                    format!("question {} has duplicate option id {}", question.id, option.id),
                ));
            }
            question.options.add(option.id.clone(), option);
        }

        Ok(question)
    }
}
