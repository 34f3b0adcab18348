//! One question per option value type, chained "1" through "10".

use questionnaire_fsm::{
    Event, FiniteStateMachine, Journal, MetricsRegistry, OptionValue, Question, QuestionOption,
    QuestionType, Questionnaire, State, ValueKind,
};

fn chain() -> (Questionnaire, Vec<QuestionOption>) {
    let options = vec![
        QuestionOption::new("Red").with_next_question_id("2"),
        QuestionOption::new(1).with_next_question_id("3"),
        QuestionOption::new(true).with_next_question_id("4"),
        QuestionOption::new(1.1f32).with_next_question_id("5"),
        QuestionOption::new(1.1f64).with_next_question_id("6"),
        QuestionOption::new(vec!["a", "b", "c"]).with_next_question_id("7"),
        QuestionOption::new(vec![1i64, 2, 3]).with_next_question_id("8"),
        QuestionOption::new(vec![true, false, true]).with_next_question_id("9"),
        QuestionOption::new(vec![1.1f32, 2.2, 3.3]).with_next_question_id("10"),
        QuestionOption::new(vec![1.1f64, 2.2, 3.3]).with_state(State::Completed),
    ];

    let shapes = [
        ("String?", QuestionType::Text, ValueKind::String),
        ("Int?", QuestionType::SingleSelect, ValueKind::Int),
        ("Bool?", QuestionType::SingleSelect, ValueKind::Bool),
        ("Float32?", QuestionType::SingleSelect, ValueKind::Float32),
        ("Float64?", QuestionType::SingleSelect, ValueKind::Float64),
        ("Slice of strings?", QuestionType::MultipleSelect, ValueKind::StringList),
        ("Slice of ints?", QuestionType::MultipleSelect, ValueKind::IntList),
        ("Slice of bool?", QuestionType::MultipleSelect, ValueKind::BoolList),
        ("Slice of float32?", QuestionType::MultipleSelect, ValueKind::Float32List),
        ("Slice of float64?", QuestionType::MultipleSelect, ValueKind::Float64List),
    ];

    let questions = shapes
        .iter()
        .zip(&options)
        .enumerate()
        .map(|(i, ((label, question_type, kind), option))| {
            Question::builder((i + 1).to_string(), *label, *question_type, *kind)
                .option(option.clone())
                .build()
                .unwrap()
        })
        .collect();

    (Questionnaire::new("Simple Survey - 2", questions).unwrap(), options)
}

#[test]
fn every_value_type_walks_to_completion() {
    let (questionnaire, options) = chain();
    let registry = MetricsRegistry::new("test");
    let mut fsm =
        FiniteStateMachine::new("12345", questionnaire, |_: &Event, _: &Journal| {}, &registry)
            .unwrap();
    fsm.start().unwrap();

    for (i, option) in options.iter().enumerate() {
        assert_eq!(fsm.current_question_id(), Some((i + 1).to_string().as_str()));
        let event = fsm.forward(option).unwrap();
        assert_eq!(event.total_answers, i + 1);
        assert_eq!(
            event.current_answer.as_ref().and_then(|a| a.value()),
            Some(&option.value)
        );
    }

    assert_eq!(fsm.state(), State::Completed);
    assert_eq!(fsm.answers().size(), 10);
    assert_eq!(
        fsm.answers().get("6").unwrap().value(),
        Some(&OptionValue::StringList(vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string()
        ]))
    );
}

#[test]
fn answers_keep_their_type_through_json() {
    let (questionnaire, options) = chain();
    let registry = MetricsRegistry::new("test");
    let mut fsm =
        FiniteStateMachine::new("12345", questionnaire, |_: &Event, _: &Journal| {}, &registry)
            .unwrap();
    fsm.start().unwrap();
    for option in &options {
        fsm.forward(option).unwrap();
    }

    let restored = Event::from_json(&fsm.dump().to_json().unwrap()).unwrap();
    let kinds: Vec<ValueKind> = restored
        .answers
        .values()
        .iter()
        .filter_map(|a| a.value().map(OptionValue::kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ValueKind::String,
            ValueKind::Int,
            ValueKind::Bool,
            ValueKind::Float32,
            ValueKind::Float64,
            ValueKind::StringList,
            ValueKind::IntList,
            ValueKind::BoolList,
            ValueKind::Float32List,
            ValueKind::Float64List,
        ]
    );
    assert_eq!(
        restored.answers.get("9").unwrap().value(),
        Some(&OptionValue::Float32List(vec![1.1, 2.2, 3.3]))
    );
}

#[test]
fn mismatched_kind_is_rejected_at_build() {
    let err = Question::builder("x", "Int?", QuestionType::SingleSelect, ValueKind::Int)
        .option(QuestionOption::new("one"))
        .build()
        .unwrap_err();
    assert_eq!(err.code(), "ERR_ANSWER_OPTION_TYPE");
}
