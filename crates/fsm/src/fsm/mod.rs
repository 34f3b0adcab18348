//! Per-user finite state machine walking a questionnaire.
//!
//! A machine starts on the question at ordinal 0, records an answer on
//! every `forward`, and routes to the option's next question (fixed id or
//! resolver evaluated at that moment) or, for a leaf option, adopts the
//! option's terminal state. `backward` and `jump` move the cursor back to a
//! question that already has an answer; answers are never deleted.
//!
//! Every transition emits an [`Event`]: it is appended to the journal and
//! handed to the sink before the transition returns.
//!
//! A machine is one session. Transitions take `&mut self`; callers sharing
//! a machine across threads must lock around whole transitions.

use std::fmt;

use questionnaire_model::common::now_rfc3339;
use questionnaire_model::{
    Answer, AnswerMap, Question, QuestionOption, Questionnaire, QuestionnaireError, State,
};

use crate::event::{Event, EventSink, Journal};
use crate::metrics::{FsmMetrics, MetricsRegistry, Transition};

pub struct FiniteStateMachine {
    user_id: String,
    questionnaire: Questionnaire,
    answers: AnswerMap,
    state: State,
    current_question_id: Option<String>,
    previous_question_id: Option<String>,
    current_question: Option<Question>,
    previous_question: Option<Question>,
    journal: Journal,
    next_sequence: u64,
    sink: Box<dyn EventSink>,
    metrics: FsmMetrics,
    name: String,
}

impl fmt::Debug for FiniteStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiniteStateMachine")
            .field("user_id", &self.user_id)
            .field("questionnaire", &self.questionnaire.id)
            .field("state", &self.state)
            .field("current_question_id", &self.current_question_id)
            .field("previous_question_id", &self.previous_question_id)
            .field("answers", &self.answers.size())
            .field("journal", &self.journal.len())
            .finish()
    }
}

impl FiniteStateMachine {
    pub fn new(
        user_id: impl Into<String>,
        questionnaire: Questionnaire,
        sink: impl EventSink + 'static,
        registry: &MetricsRegistry,
    ) -> Result<Self, QuestionnaireError> {
        let user_id = user_id.into();
        let name = questionnaire.metric_name();
        let metrics = FsmMetrics::new(registry, &name);

        let invalid = if user_id.trim().is_empty() {
            Some("user id must not be empty")
        } else if questionnaire.is_empty() {
            Some("questionnaire has no questions")
        } else {
            None
        };
        if let Some(message) = invalid {
            metrics.incr(Transition::InstantiationFailed);
            tracing::warn!(questionnaire = %name, reason = message, "failed to create state machine");
            return Err(QuestionnaireError::Validation {
                entity: "state machine".to_string(),
                message: message.to_string(),
            });
        }

        tracing::info!(user_id = %user_id, questionnaire = %name, "state machine created");

        Ok(Self {
            user_id,
            questionnaire,
            answers: AnswerMap::new(),
            state: State::Initialized,
            current_question_id: None,
            previous_question_id: None,
            current_question: None,
            previous_question: None,
            journal: Journal::default(),
            next_sequence: 0,
            sink: Box::new(sink),
            metrics,
            name,
        })
    }

    // ──────────────────────────────────────────────
    // Accessors
    // ──────────────────────────────────────────────

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn current_question_id(&self) -> Option<&str> {
        self.current_question_id.as_deref()
    }

    pub fn previous_question_id(&self) -> Option<&str> {
        self.previous_question_id.as_deref()
    }

    /// Question carried by the last emitted event.
    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    pub fn previous_question(&self) -> Option<&Question> {
        self.previous_question.as_ref()
    }

    /// Every question has an answer.
    pub fn is_complete(&self) -> bool {
        self.answers.size() == self.questionnaire.len()
    }

    // ──────────────────────────────────────────────
    // Transitions
    // ──────────────────────────────────────────────

    /// Load the question at ordinal 0. Only valid on a fresh machine;
    /// otherwise nothing happens and `None` is returned.
    pub fn start(&mut self) -> Option<Event> {
        let _span = tracing::debug_span!("start", user_id = %self.user_id, questionnaire = %self.name)
            .entered();

        if self.state != State::Initialized {
            tracing::debug!(state = %self.state, "already started, ignoring start");
            return None;
        }
        let first = self.questionnaire.question_at(0)?;

        self.state = State::Running;
        self.current_question_id = Some(first.id.clone());
        self.metrics.incr(Transition::Initialized);

        Some(self.emit(None, Some(first), None))
    }

    /// Answer the current question with `option` and advance.
    pub fn forward(&mut self, option: &QuestionOption) -> Result<Event, QuestionnaireError> {
        let _span =
            tracing::debug_span!("forward", user_id = %self.user_id, questionnaire = %self.name)
                .entered();

        match self.try_forward(option) {
            Ok(event) => {
                self.metrics.incr(Transition::Forward);
                Ok(event)
            }
            Err(e) => {
                self.metrics.incr(Transition::ForwardFailed);
                tracing::warn!(code = e.code(), option_id = %option.id, err = %e, "forward failed");
                Err(e)
            }
        }
    }

    /// Answer the current question with untyped input, picking the declared
    /// option whose value matches.
    pub fn forward_value(
        &mut self,
        value: &serde_json::Value,
    ) -> Result<Event, QuestionnaireError> {
        let question = self.require_current_question()?;
        let typed = question.classify_value(value)?;
        let option = question.find_option_by_value(&typed).ok_or_else(|| {
            QuestionnaireError::Validation {
                entity: "answer".to_string(),
                message: format!("question {} has no option with value {}", question.id, typed),
            }
        })?;
        self.forward(&option)
    }

    /// Return to the question the current one was reached from. No-op when
    /// nothing was answered there.
    pub fn backward(&mut self) -> Option<Event> {
        let _span =
            tracing::debug_span!("backward", user_id = %self.user_id, questionnaire = %self.name)
                .entered();

        let target = self.previous_question_id.clone()?;
        self.navigate(&target, Transition::Backward)
    }

    /// Move to an already answered question. No-op when `id` has no answer.
    pub fn jump(&mut self, id: &str) -> Option<Event> {
        let _span = tracing::debug_span!("jump", user_id = %self.user_id, questionnaire = %self.name, question_id = id)
            .entered();

        self.navigate(id, Transition::Jump)
    }

    /// Close the session.
    pub fn done(&mut self) -> Event {
        self.state = State::Done;
        self.metrics.incr(Transition::Done);
        self.dump()
    }

    /// Re-emit the current snapshot without changing anything.
    pub fn dump(&mut self) -> Event {
        let previous = self
            .previous_question_id
            .as_deref()
            .and_then(|id| self.questionnaire.question(id));
        let current = self
            .current_question_id
            .as_deref()
            .and_then(|id| self.questionnaire.question(id));
        let answer = self
            .current_question_id
            .as_deref()
            .and_then(|id| self.answers.get(id));
        self.emit(previous, current, answer)
    }

    /// Resume from a previously emitted event.
    ///
    /// When the embedded questionnaire carries the same hash as the one
    /// this machine was built with, the live definition is kept (resolvers
    /// and hooks do not survive serialization) and only the recorded
    /// previous-question links are copied over. Otherwise the embedded copy
    /// is adopted as is; see [`load_verified`](Self::load_verified).
    pub fn load(&mut self, event: Event) {
        if event.user_id != self.user_id {
            tracing::warn!(
                user_id = %self.user_id,
                event_user_id = %event.user_id,
                "loading event of another user"
            );
        }

        self.current_question_id = event
            .current_question_id
            .or_else(|| event.current_question.as_ref().map(|q| q.id.clone()));
        self.previous_question_id = event
            .previous_question_id
            .or_else(|| event.previous_question.as_ref().map(|q| q.id.clone()));
        self.current_question = event.current_question;
        self.previous_question = event.previous_question;
        self.answers = event.answers;
        if event.questionnaire.hash == self.questionnaire.hash {
            for question in event.questionnaire.questions.values() {
                self.questionnaire.questions.update(&question.id, |live| {
                    live.previous_question_id = question.previous_question_id.clone();
                });
            }
        } else {
            tracing::warn!(
                expected = %self.questionnaire.hash,
                actual = %event.questionnaire.hash,
                "loading event of another questionnaire definition"
            );
            self.questionnaire = event.questionnaire;
        }
        self.state = event.state;
        self.user_id = event.user_id;
        self.next_sequence = event.sequence + 1;

        self.metrics.incr(Transition::Loaded);
        tracing::debug!(
            user_id = %self.user_id,
            state = %self.state,
            answers = self.answers.size(),
            "state machine loaded"
        );
    }

    /// Like [`load`](Self::load), but first checks that the embedded
    /// questionnaire still matches its own hash and the one this machine
    /// was created with.
    pub fn load_verified(&mut self, event: Event) -> Result<(), QuestionnaireError> {
        event.questionnaire.verify()?;
        if event.questionnaire.hash != self.questionnaire.hash {
            return Err(QuestionnaireError::TamperedQuestionnaire {
                expected: self.questionnaire.hash.clone(),
                actual: event.questionnaire.hash.clone(),
            });
        }
        self.load(event);
        Ok(())
    }

    // ──────────────────────────────────────────────
    // Internals
    // ──────────────────────────────────────────────

    fn require_current_question(&self) -> Result<Question, QuestionnaireError> {
        self.current_question_id
            .as_deref()
            .and_then(|id| self.questionnaire.question(id))
            .ok_or(QuestionnaireError::NotStarted)
    }

    /// Everything that can fail happens before the first mutation, so a
    /// failed forward leaves the machine untouched.
    fn try_forward(&mut self, option: &QuestionOption) -> Result<Event, QuestionnaireError> {
        let question = self.require_current_question()?;
        let provisional = Answer::new(question.clone(), Some(option.clone()))?;
        if !question.options.contains_key(&option.id) {
            return Err(QuestionnaireError::Validation {
                entity: "answer".to_string(),
                message: format!("option {} does not belong to question {}", option.id, question.id),
            });
        }

        // Resolvers see the answers as they will be once this one is stored.
        let staged = self.answers.clone();
        staged.add(question.id.clone(), provisional);
        let next_id = match option.resolve_next_question(&staged) {
            Some(id) if self.questionnaire.question(&id).is_some() => Some(id),
            Some(id) => {
                tracing::warn!(option_id = %option.id, next = %id, "option resolved to unknown question");
                None
            }
            None => None,
        };

        if next_id.is_none() && option.state.is_none() {
            return Err(QuestionnaireError::ForwardMissingQors {
                question_id: question.id.clone(),
                option_id: option.id.clone(),
            });
        }

        let answer = Answer::new(question.clone(), Some(option.resolved(next_id.clone())))?;
        if let (Some(hook), Some(snapshot)) = (option.hook(), answer.snapshot()) {
            hook.call(&snapshot)
                .map_err(|source| QuestionnaireError::Hook {
                    option_id: option.id.clone(),
                    source,
                })?;
        }

        self.state = State::Running;
        self.answers.add(question.id.clone(), answer.clone());
        if self.is_complete() {
            self.state = State::Completed;
            self.metrics.incr(Transition::Completed);
        }

        match next_id {
            Some(next_id) => {
                self.questionnaire.record_previous_question(&next_id, &question.id);
                let next = self.questionnaire.question(&next_id);
                self.previous_question_id = Some(question.id.clone());
                self.current_question_id = Some(next_id);
                if let Some(state) = option.state {
                    self.state = state;
                }
                Ok(self.emit(Some(question), next, Some(answer)))
            }
            None => {
                if let Some(state) = option.state {
                    self.state = state;
                }
                let previous = question
                    .previous_question_id
                    .as_deref()
                    .and_then(|id| self.questionnaire.question(id));
                self.previous_question_id = question.previous_question_id.clone();
                Ok(self.emit(previous, Some(question), Some(answer)))
            }
        }
    }

    fn navigate(&mut self, target: &str, transition: Transition) -> Option<Event> {
        if self.state == State::Initialized {
            tracing::debug!("not started, ignoring navigation");
            return None;
        }
        let Some(answer) = self.answers.get(target) else {
            tracing::debug!(question_id = target, "no answer recorded, ignoring navigation");
            return None;
        };

        let leaving = self
            .current_question_id
            .as_deref()
            .and_then(|id| self.questionnaire.question(id));
        let answered = &answer.question;

        self.current_question_id = Some(answered.id.clone());
        self.previous_question_id = answered.previous_question_id.clone();
        self.state = State::Running;
        self.metrics.incr(transition);

        let landing = self
            .questionnaire
            .question(&answered.id)
            .unwrap_or_else(|| answered.clone());
        Some(self.emit(leaving, Some(landing), Some(answer)))
    }

    fn emit(
        &mut self,
        previous: Option<Question>,
        current: Option<Question>,
        current_answer: Option<Answer>,
    ) -> Event {
        let event = Event {
            sequence: self.next_sequence,
            emitted_at: now_rfc3339(),
            user_id: self.user_id.clone(),
            state: self.state,
            current_question_index: current.as_ref().map(Question::index).unwrap_or(0),
            previous_question: previous.clone(),
            current_question: current.clone(),
            current_answer,
            current_question_id: self.current_question_id.clone(),
            previous_question_id: self.previous_question_id.clone(),
            total_answers: self.answers.size(),
            total_questions: self.questionnaire.len(),
            answers: self.answers.clone(),
            questionnaire: self.questionnaire.clone(),
        };

        self.previous_question = previous;
        self.current_question = current;
        self.next_sequence += 1;
        self.journal.push(event.clone());
        self.sink.on_event(&event, &self.journal);
        self.metrics.incr(Transition::Emitted);

        tracing::debug!(
            sequence = event.sequence,
            state = %event.state,
            current = ?event.current_question_id,
            total_answers = event.total_answers,
            "event emitted"
        );

        event
    }
}
