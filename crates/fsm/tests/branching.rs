//! End-to-end walk through a branching survey.
//!
//! Three questions wired with fixed and resolver targets:
//!
//!   wyfc (color)      Red  -> hmyopedyh     Blue -> resolver -> ayfgpl
//!   hmyopedyh (years) 0    -> ayfgpl        1    -> (leaf, Completed)
//!   ayfgpl (Rust?)    true -> hmyopedyh     false -> wyfc
//!
//! Covers forward routing, backward, persisting a dump, resuming it in a
//! second machine, jump, done, and the JSON-lines sink.

use std::fs;
use std::sync::{Arc, Mutex};

use questionnaire_fsm::{
    counter_name, Event, FiniteStateMachine, Journal, JsonLinesSink, MetricsRegistry, Question,
    QuestionOption, QuestionType, Questionnaire, State, Transition, ValueKind,
};

const Q1: &str = "wyfc";
const Q2: &str = "hmyopedyh";
const Q3: &str = "ayfgpl";

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

struct Options {
    red: QuestionOption,
    blue: QuestionOption,
    n0: QuestionOption,
    n1: QuestionOption,
    yes: QuestionOption,
}

fn survey() -> (Questionnaire, Options) {
    let red = QuestionOption::new("Red").with_next_question_id(Q2);
    let blue = QuestionOption::new("Blue").with_next_question_fn(|_| Some(Q3.to_string()));
    let n0 = QuestionOption::new(0).with_next_question_id(Q3);
    let n1 = QuestionOption::new(1).with_state(State::Completed);
    let yes = QuestionOption::new(true).with_next_question_id(Q2);
    let no = QuestionOption::new(false).with_next_question_id(Q1);

    let q1 = Question::builder(Q1, "What's your favorite color?", QuestionType::Text, ValueKind::String)
        .options([red.clone(), blue.clone()])
        .build()
        .unwrap();
    let q2 = Question::builder(
        Q2,
        "How many years of programming experience do you have?",
        QuestionType::SingleSelect,
        ValueKind::Int,
    )
    .options([n0.clone(), n1.clone()])
    .build()
    .unwrap();
    let q3 = Question::builder(
        Q3,
        "Are you familiar with the Rust programming language?",
        QuestionType::SingleSelect,
        ValueKind::Bool,
    )
    .options([yes.clone(), no])
    .build()
    .unwrap();

    let questionnaire = Questionnaire::new("Simple Survey - 1", vec![q1, q2, q3]).unwrap();
    (
        questionnaire,
        Options {
            red,
            blue,
            n0,
            n1,
            yes,
        },
    )
}

fn recorder() -> (Arc<Mutex<Vec<u64>>>, impl FnMut(&Event, &Journal) + Send + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink = move |event: &Event, journal: &Journal| {
        assert_eq!(journal.len() as u64, event.sequence + 1);
        sink_seen.lock().unwrap().push(event.sequence);
    };
    (seen, sink)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[test]
fn walk_dump_resume_and_finish() {
    let (questionnaire, o) = survey();
    let registry = MetricsRegistry::new("test");
    let (seen, sink) = recorder();

    // questionnaires survive a JSON round trip with their hash intact
    let json = serde_json::to_string(&questionnaire).unwrap();
    let decoded: Questionnaire = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded.hash, questionnaire.hash);
    decoded.verify().unwrap();

    let mut fsm =
        FiniteStateMachine::new("12345", questionnaire.clone(), sink, &registry).unwrap();
    fsm.start().unwrap();
    assert_eq!(fsm.current_question_id(), Some(Q1));

    // Blue resolves to the third question.
    fsm.forward(&o.blue).unwrap();
    assert_eq!(fsm.current_question_id(), Some(Q3));
    let (_, last) = fsm.answers().last().unwrap();
    assert_eq!(last.value().and_then(|v| v.as_str()), Some("Blue"));

    fsm.forward(&o.yes).unwrap();
    assert_eq!(fsm.current_question_id(), Some(Q2));
    let (_, last) = fsm.answers().last().unwrap();
    assert_eq!(last.value().and_then(|v| v.as_bool()), Some(true));

    // 0 years routes back to the third question.
    fsm.forward(&o.n0).unwrap();
    assert_eq!(fsm.current_question_id(), Some(Q3));
    assert_eq!(fsm.state(), State::Completed);

    // Backward restores the prior question; its answer is still there.
    fsm.backward().unwrap();
    assert_eq!(fsm.current_question_id(), Some(Q2));
    assert_eq!(fsm.state(), State::Running);
    assert_eq!(
        fsm.answers().get(Q2).unwrap().value().and_then(|v| v.as_int()),
        Some(0)
    );
    assert_eq!(fsm.answers().size(), 3);

    // 1 year is a leaf carrying Completed.
    fsm.forward(&o.n1).unwrap();
    assert_eq!(
        fsm.answers().get(Q2).unwrap().value().and_then(|v| v.as_int()),
        Some(1)
    );
    assert_eq!(fsm.state(), State::Completed);
    assert_eq!(fsm.current_question_id(), Some(Q2));

    // Persist, then resume in a second machine.
    let saved = fsm.dump().to_json().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4, 5, 6]);

    let loaded = Event::from_json(&saved).unwrap();
    assert_eq!(loaded.state, State::Completed);
    assert_eq!(loaded.total_answers, 3);
    assert_eq!(loaded.total_questions, 3);

    let mut fsm2 = FiniteStateMachine::new(
        "12345",
        questionnaire,
        |_: &Event, _: &Journal| {},
        &registry,
    )
    .unwrap();
    fsm2.load_verified(loaded).unwrap();
    assert_eq!(fsm2.current_question_id(), Some(Q2));
    assert_eq!(fsm2.state(), State::Completed);

    fsm2.jump(Q1).unwrap();
    assert_eq!(fsm2.current_question_id(), Some(Q1));
    assert_eq!(fsm2.state(), State::Running);

    fsm2.forward(&o.red).unwrap();
    assert_eq!(fsm2.current_question_id(), Some(Q2));
    assert_eq!(
        fsm2.answers().get(Q1).unwrap().value().and_then(|v| v.as_str()),
        Some("Red")
    );

    let done = fsm2.done();
    assert_eq!(fsm2.state(), State::Done);
    assert_eq!(done.state, State::Done);
    assert_eq!(fsm2.journal().len(), 3);

    let journal: Vec<Event> = serde_json::from_str(&fsm2.journal().to_json().unwrap()).unwrap();
    assert_eq!(journal.len(), 3);
    assert_eq!(journal[2].state, State::Done);

    // both machines share the survey's counters
    let get = |t| registry.get(&counter_name("simplesurvey-1", t)).unwrap();
    assert_eq!(get(Transition::Initialized), 1);
    assert_eq!(get(Transition::Forward), 5);
    assert_eq!(get(Transition::Backward), 1);
    assert_eq!(get(Transition::Jump), 1);
    assert_eq!(get(Transition::Loaded), 1);
    assert_eq!(get(Transition::Done), 1);
    assert_eq!(get(Transition::Emitted), 10);
}

#[test]
fn json_lines_sink_writes_one_event_per_line() {
    let (questionnaire, o) = survey();
    let registry = MetricsRegistry::new("test");
    let file = tempfile::NamedTempFile::new().unwrap();
    let sink = JsonLinesSink::new(file.reopen().unwrap());

    let mut fsm = FiniteStateMachine::new("12345", questionnaire, sink, &registry).unwrap();
    fsm.start().unwrap();
    fsm.forward(&o.red).unwrap();
    fsm.forward(&o.n1).unwrap();
    fsm.done();

    let contents = fs::read_to_string(file.path()).unwrap();
    let events: Vec<Event> = contents
        .lines()
        .map(|line| Event::from_json(line).unwrap())
        .collect();

    assert_eq!(events.len(), 4);
    assert_eq!(
        events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
    assert_eq!(events[0].current_question_id.as_deref(), Some(Q1));
    assert_eq!(events[2].state, State::Completed);
    assert_eq!(events[3].state, State::Done);
    assert_eq!(events[3].answers.keys(), vec![Q1, Q2]);
}

#[test]
fn untyped_answers_follow_the_same_routes() {
    let (questionnaire, _) = survey();
    let registry = MetricsRegistry::new("test");
    let mut fsm =
        FiniteStateMachine::new("12345", questionnaire, |_: &Event, _: &Journal| {}, &registry)
            .unwrap();
    fsm.start().unwrap();

    fsm.forward_value(&serde_json::json!("Blue")).unwrap();
    assert_eq!(fsm.current_question_id(), Some(Q3));
    fsm.forward_value(&serde_json::json!(false)).unwrap();
    assert_eq!(fsm.current_question_id(), Some(Q1));
    assert_eq!(
        fsm.questionnaire().question(Q1).unwrap().previous_question_id.as_deref(),
        Some(Q3)
    );
}

#[test]
fn resumed_session_routes_through_resolvers() {
    let (questionnaire, o) = survey();
    let registry = MetricsRegistry::new("test");
    let mut fsm = FiniteStateMachine::new(
        "12345",
        questionnaire.clone(),
        |_: &Event, _: &Journal| {},
        &registry,
    )
    .unwrap();
    fsm.start().unwrap();
    fsm.forward(&o.red).unwrap();
    let saved = fsm.dump().to_json().unwrap();

    let mut resumed = FiniteStateMachine::new(
        "12345",
        questionnaire,
        |_: &Event, _: &Journal| {},
        &registry,
    )
    .unwrap();
    resumed.load_verified(Event::from_json(&saved).unwrap()).unwrap();
    resumed.jump(Q1).unwrap();

    // answer with untyped input so the option comes from the machine's own
    // questionnaire, not from a caller-held clone
    resumed.forward_value(&serde_json::json!("Blue")).unwrap();
    assert_eq!(resumed.current_question_id(), Some(Q3));
    assert_eq!(resumed.previous_question_id(), Some(Q1));
    assert_eq!(
        resumed.questionnaire().question(Q2).unwrap().previous_question_id.as_deref(),
        Some(Q1)
    );
}
