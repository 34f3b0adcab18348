//! Questionnaire assembly and tamper-evidence hashing.
//!
//! A questionnaire is frozen at assembly: questions get their ordinal
//! index in input order and the content hash is computed exactly once.
//! The hash is never refreshed afterwards, so recomputing it later and
//! comparing is how edits are detected.
//!
//! The hashed definition leaves out the stored hash itself and each
//! question's `previous_question_id`, which sessions write while walking.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::common::{new_id, now_rfc3339};
use crate::error::QuestionnaireError;
use crate::option::NextQuestion;
use crate::ordered_map::OrderedMap;
use crate::question::Question;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: String,
    pub title: String,
    pub created_at: String,
    /// Lowercase hex SHA-256 of the assembly-time definition.
    pub hash: String,
    pub questions: OrderedMap<Question>,
}

impl Questionnaire {
    /// Assemble a questionnaire with a generated id.
    pub fn new(
        title: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, QuestionnaireError> {
        Self::with_id(new_id(), title, questions)
    }

    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, QuestionnaireError> {
        let id = id.into();
        let title = title.into();
        if id.trim().is_empty() {
            return Err(QuestionnaireError::validation("questionnaire", "id must not be empty"));
        }
        if title.trim().is_empty() {
            return Err(QuestionnaireError::validation(
                "questionnaire",
                "title must not be empty",
            ));
        }
        if questions.is_empty() {
            return Err(QuestionnaireError::validation(
                "questionnaire",
                format!("'{}' has no questions", title),
            ));
        }

        let map = OrderedMap::new();
        for (i, mut q) in questions.into_iter().enumerate() {
            if map.contains_key(&q.id) {
                return Err(QuestionnaireError::validation(
                    "questionnaire",
                    format!("duplicate question id {}", q.id),
                ));
            }
            q.set_index(i);
            map.add(q.id.clone(), q);
        }

        // Fixed routing must land on a question of this questionnaire.
        for q in map.values() {
            for opt in q.options.values() {
                if let Some(NextQuestion::Id(target)) = opt.next_question() {
                    if !map.contains_key(target) {
                        return Err(QuestionnaireError::validation(
                            "questionnaire",
                            format!(
                                "option {} of question {} points to unknown question {}",
                                opt.id, q.id, target
                            ),
                        ));
                    }
                }
            }
        }

        let mut questionnaire = Self {
            id,
            title,
            created_at: now_rfc3339(),
            hash: String::new(),
            questions: map,
        };
        questionnaire.hash = questionnaire.compute_hash()?;
        Ok(questionnaire)
    }

    /// Hash of the current definition. Equal to `self.hash` unless the
    /// content changed after assembly.
    pub fn compute_hash(&self) -> Result<String, QuestionnaireError> {
        let mut definition = self.clone();
        definition.hash = String::new();
        for id in definition.questions.keys() {
            definition.questions.update(&id, |q| q.previous_question_id = None);
        }

        let canonical = serde_json::to_string(&serde_json::to_value(&definition)?)?;
        let hash = Sha256::digest(canonical.as_bytes());
        Ok(format!("{:x}", hash))
    }

    /// Recompute the hash and compare with the stored one.
    pub fn verify(&self) -> Result<(), QuestionnaireError> {
        let actual = self.compute_hash()?;
        if actual != self.hash {
            return Err(QuestionnaireError::TamperedQuestionnaire {
                expected: self.hash.clone(),
                actual,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.size()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, id: &str) -> Option<Question> {
        self.questions.get(id)
    }

    pub fn question_at(&self, index: usize) -> Option<Question> {
        self.questions.get_by_index(index)
    }

    /// Set `id`'s previous question unless one is already recorded.
    /// Returns whether it was written.
    pub fn record_previous_question(&mut self, id: &str, previous_id: &str) -> bool {
        let mut written = false;
        self.questions.update(id, |q| {
            written = q.set_previous_question_id_once(previous_id);
        });
        written
    }

    /// Title lowercased with whitespace removed, used to name counters.
    pub fn metric_name(&self) -> String {
        self.title
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    }
}
