//! Named integer counters.
//!
//! A [`MetricsRegistry`] is created by the caller and handed to every
//! machine; counters with the same name are shared, so machines walking the
//! same questionnaire aggregate into one set. Counter names follow
//! `{Type}.{questionnaire}.{transition}.counter`.
//!
//! Counters are informational only: nothing reads them to make decisions.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::FsmConfig;

pub const FSM_TYPE: &str = "FiniteStateMachine";
pub const COUNTER_LABEL: &str = "counter";

/// What a machine counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transition {
    Initialized,
    Forward,
    ForwardFailed,
    Backward,
    Jump,
    Completed,
    Done,
    Emitted,
    Loaded,
    InstantiationFailed,
}

impl Transition {
    pub const ALL: [Transition; 10] = [
        Transition::Initialized,
        Transition::Forward,
        Transition::ForwardFailed,
        Transition::Backward,
        Transition::Jump,
        Transition::Completed,
        Transition::Done,
        Transition::Emitted,
        Transition::Loaded,
        Transition::InstantiationFailed,
    ];

    pub fn segment(&self) -> &'static str {
        match self {
            Transition::Initialized => "initialized",
            Transition::Forward => "running.forward",
            Transition::ForwardFailed => "running.forward.failed",
            Transition::Backward => "running.backward",
            Transition::Jump => "running.jump",
            Transition::Completed => "completed",
            Transition::Done => "done",
            Transition::Emitted => "emitted",
            Transition::Loaded => "loaded",
            Transition::InstantiationFailed => "instantiated.failed",
        }
    }
}

pub fn counter_name(questionnaire: &str, transition: Transition) -> String {
    format!(
        "{}.{}.{}.{}",
        FSM_TYPE,
        questionnaire,
        transition.segment(),
        COUNTER_LABEL
    )
}

#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicU64>);

impl Counter {
    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub struct MetricsRegistry {
    prefix: String,
    counters: Mutex<BTreeMap<String, Counter>>,
}

impl MetricsRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counters: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn from_config(config: &FsmConfig) -> Self {
        Self::new(config.metrics_prefix.clone())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Counter registered under `name`, created at zero on first use.
    pub fn counter(&self, name: &str) -> Counter {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.entry(name.to_string()).or_default().clone()
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.get(name).map(Counter::get)
    }

    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.iter().map(|(k, c)| (k.clone(), c.get())).collect()
    }

    /// One `prefix.name value` line per counter, sorted by name.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in self.snapshot() {
            let _ = writeln!(out, "{}.{} {}", self.prefix, name, value);
        }
        out
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::from_config(&FsmConfig::default())
    }
}

/// The counters one machine increments, resolved once at construction.
#[derive(Debug, Clone)]
pub(crate) struct FsmMetrics {
    counters: BTreeMap<Transition, Counter>,
}

impl FsmMetrics {
    pub(crate) fn new(registry: &MetricsRegistry, questionnaire: &str) -> Self {
        let counters = Transition::ALL
            .iter()
            .map(|t| (*t, registry.counter(&counter_name(questionnaire, *t))))
            .collect();
        Self { counters }
    }

    pub(crate) fn incr(&self, transition: Transition) {
        if let Some(counter) = self.counters.get(&transition) {
            counter.incr();
        }
    }
}
