//! The explicit test environment: the event hub, the injection root, and the
//! active log sink that test bodies share during a run.
//!
//! Instead of process-wide singletons with ad hoc lifecycle, an
//! [`Environment`] is created once per run and handed by [`SharedEnv`] handle
//! to every unit's construction and execution. [`Environment::reset`] is the
//! whole-environment reset applied exactly once per discovered test: a fresh
//! hub, a fresh injection root, and the host default singleton set, applied
//! synchronously with no visible partial state.
use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
};

/// Handle to the environment shared between the iterator, a unit, and its
/// in-flight body. Only one unit body executes at a time, so no locking.
pub type SharedEnv = Rc<RefCell<Environment>>;

/// Destination of the active logger. Units refuse to run unless the
/// host-bound sink is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    /// Logging is wired to the host runtime.
    Host,
    /// Plain console logging, the unconfigured fallback.
    Console,
}

/// Collector for diagnostic output written by a test subject. This is the
/// capability a suite's second constructor form receives.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Diagnostics {
    /// Record one line of diagnostic output.
    pub fn write_line(&self, line: impl Into<String>) {
        self.lines.borrow_mut().push(line.into());
    }

    /// Snapshot of everything written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

/// Topic-keyed event-notification hub.
#[derive(Default)]
pub struct EventHub {
    subscribers: HashMap<String, Vec<Rc<dyn Fn()>>>,
}

impl EventHub {
    /// Register `action` to run whenever `topic` is published.
    pub fn subscribe<F: Fn() + 'static>(&mut self, topic: &str, action: F) {
        self.subscribers
            .entry(topic.to_string())
            .or_insert_with(Vec::new)
            .push(Rc::new(action));
    }

    /// Publish `topic`, running every subscribed action. Returns the number
    /// of subscribers notified.
    pub fn publish(&self, topic: &str) -> usize {
        match self.subscribers.get(topic) {
            Some(actions) => {
                for action in actions {
                    action();
                }
                actions.len()
            }
            None => 0,
        }
    }

    /// Number of actions currently subscribed to `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers.get(topic).map(Vec::len).unwrap_or(0)
    }
}

/// Type-keyed service locator holding one singleton per type.
#[derive(Default)]
pub struct Injector {
    singletons: HashMap<TypeId, Rc<dyn Any>>,
}

impl Injector {
    /// Install (or replace) the singleton for `T`.
    pub fn set_singleton<T: Any>(&mut self, value: T) {
        self.singletons.insert(TypeId::of::<T>(), Rc::new(value));
    }

    /// Look up the singleton for `T`.
    pub fn get_singleton<T: Any>(&self) -> Option<Rc<T>> {
        self.singletons
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|rc| rc.downcast::<T>().ok())
    }

    /// Drop the singleton for `T`. Returns whether one was present.
    pub fn remove_singleton<T: Any>(&mut self) -> bool {
        self.singletons.remove(&TypeId::of::<T>()).is_some()
    }

    /// Number of registered singletons.
    pub fn len(&self) -> usize {
        self.singletons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.singletons.is_empty()
    }
}

/// Shared services for one run.
pub struct Environment {
    /// Event-notification hub visible to test bodies.
    pub hub: EventHub,
    /// Injection root visible to test bodies.
    pub injector: Injector,
    log: LogSink,
    generation: u64,
}

impl Environment {
    /// A fresh environment with the host default singleton set applied.
    pub fn new() -> Self {
        let mut env = Environment {
            hub: EventHub::default(),
            injector: Injector::default(),
            log: LogSink::Host,
            generation: 0,
        };
        env.apply_host_defaults();
        env
    }

    /// A fresh environment behind a [`SharedEnv`] handle.
    pub fn shared() -> SharedEnv {
        Rc::new(RefCell::new(Environment::new()))
    }

    /// Reassign the hub and the injection root to freshly initialized
    /// instances and reapply the host defaults. Runs once per discovered
    /// test, before that test's subject is constructed.
    pub fn reset(&mut self) {
        self.hub = EventHub::default();
        self.injector = Injector::default();
        self.apply_host_defaults();
        self.generation += 1;
    }

    fn apply_host_defaults(&mut self) {
        self.log = LogSink::Host;
        self.injector.set_singleton(Diagnostics::default());
    }

    /// The sink the active logger writes to.
    pub fn log_sink(&self) -> LogSink {
        self.log
    }

    /// Swap the active log sink. Tests use this to simulate an unconfigured
    /// host; `reset` restores the host sink.
    pub fn set_log_sink(&mut self, sink: LogSink) {
        self.log = sink;
    }

    /// Monotone counter bumped by every reset. Lets a test body observe
    /// which reset produced the environment it is running against.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn injector_roundtrip() {
        let mut injector = Injector::default();
        injector.set_singleton(41_u32);
        assert_eq!(*injector.get_singleton::<u32>().unwrap(), 41);
        injector.set_singleton(42_u32);
        assert_eq!(*injector.get_singleton::<u32>().unwrap(), 42);
        assert!(injector.remove_singleton::<u32>());
        assert!(injector.get_singleton::<u32>().is_none());
        assert!(!injector.remove_singleton::<u32>());
    }

    #[test]
    fn hub_publishes_to_all_subscribers() {
        let mut hub = EventHub::default();
        let seen = Rc::new(Cell::new(0));
        for _ in 0..3 {
            let seen = seen.clone();
            hub.subscribe("saved", move || seen.set(seen.get() + 1));
        }
        assert_eq!(hub.publish("saved"), 3);
        assert_eq!(seen.get(), 3);
        assert_eq!(hub.publish("other"), 0);
    }

    #[test]
    fn reset_produces_fresh_services() {
        let mut env = Environment::new();
        env.hub.subscribe("saved", || {});
        env.injector.set_singleton("leftover".to_string());
        env.set_log_sink(LogSink::Console);
        let before = env.generation();

        env.reset();

        assert_eq!(env.hub.subscriber_count("saved"), 0);
        assert!(env.injector.get_singleton::<String>().is_none());
        assert_eq!(env.log_sink(), LogSink::Host);
        assert_eq!(env.generation(), before + 1);
    }

    #[test]
    fn host_defaults_include_diagnostics() {
        let env = Environment::new();
        assert!(env.injector.get_singleton::<Diagnostics>().is_some());
    }

    #[test]
    fn diagnostics_collects_lines() {
        let diag = Diagnostics::default();
        let alias = diag.clone();
        diag.write_line("constructed");
        alias.write_line("ran");
        assert_eq!(diag.lines(), vec!["constructed", "ran"]);
    }
}
