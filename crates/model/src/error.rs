/// Boxed error returned by post-answer hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// All errors that can be returned while building or walking a questionnaire.
#[derive(Debug, thiserror::Error)]
pub enum QuestionnaireError {
    /// A required question was answered without an option.
    #[error("question {question_id}: answer is required")]
    AnswerOptionRequired { question_id: String },

    /// The option value is not one of the supported variants, or not the
    /// variant the question declares.
    #[error("question {question_id}: option type is invalid (expected {expected}, got {got})")]
    AnswerOptionType {
        question_id: String,
        expected: String,
        got: String,
    },

    /// A leaf option declares neither a next question nor a terminal state.
    #[error(
        "question {question_id}: option {option_id} sets neither a next question nor a state"
    )]
    ForwardMissingQors {
        question_id: String,
        option_id: String,
    },

    /// A factory rejected its input.
    #[error("invalid {entity}: {message}")]
    Validation { entity: String, message: String },

    /// Forward was called before the machine loaded a question.
    #[error("machine has no current question; call start() first")]
    NotStarted,

    /// The option's post-answer hook failed.
    #[error("answer hook for option {option_id} failed: {source}")]
    Hook {
        option_id: String,
        #[source]
        source: HookError,
    },

    /// A questionnaire's content no longer matches its assembly-time hash.
    #[error("questionnaire hash mismatch: expected {expected}, got {actual}")]
    TamperedQuestionnaire { expected: String, actual: String },

    /// Canonical JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub const ERR_ANSWER_OPTION_REQUIRED: &str = "ERR_ANSWER_OPTION_REQUIRED";
pub const ERR_ANSWER_OPTION_TYPE: &str = "ERR_ANSWER_OPTION_TYPE";
pub const ERR_FORWARD_MISSING_QORS: &str = "ERR_FORWARD_MISSING_QORS";
pub const ERR_VALIDATION: &str = "ERR_VALIDATION";
pub const ERR_NOT_STARTED: &str = "ERR_NOT_STARTED";
pub const ERR_ANSWER_HOOK: &str = "ERR_ANSWER_HOOK";
pub const ERR_TAMPERED_QUESTIONNAIRE: &str = "ERR_TAMPERED_QUESTIONNAIRE";
pub const ERR_SERIALIZATION: &str = "ERR_SERIALIZATION";

impl QuestionnaireError {
    /// Stable catalog code, suitable for clients that match on strings.
    pub fn code(&self) -> &'static str {
        match self {
            QuestionnaireError::AnswerOptionRequired { .. } => ERR_ANSWER_OPTION_REQUIRED,
            QuestionnaireError::AnswerOptionType { .. } => ERR_ANSWER_OPTION_TYPE,
            QuestionnaireError::ForwardMissingQors { .. } => ERR_FORWARD_MISSING_QORS,
            QuestionnaireError::Validation { .. } => ERR_VALIDATION,
            QuestionnaireError::NotStarted => ERR_NOT_STARTED,
            QuestionnaireError::Hook { .. } => ERR_ANSWER_HOOK,
            QuestionnaireError::TamperedQuestionnaire { .. } => ERR_TAMPERED_QUESTIONNAIRE,
            QuestionnaireError::Serialization(_) => ERR_SERIALIZATION,
        }
    }

    pub(crate) fn validation(entity: &str, message: impl Into<String>) -> Self {
        QuestionnaireError::Validation {
            entity: entity.to_string(),
            message: message.into(),
        }
    }
}
