//! The test registry: suites register a name, subject constructors, and
//! named case bodies, replacing attribute-driven reflection with an explicit
//! lookup structure. Discovery is walking a suite's cases in registration
//! order; it is lazy, restartable, and an empty suite is not an error.
use std::{any::Any, fmt, future::Future, rc::Rc};

use anyhow::Error;
use futures::future::LocalBoxFuture;

use crate::{
    config::RunConfig,
    env::{Diagnostics, SharedEnv},
    errors::EngineError,
    executor::{Unit, Units},
};

/// A value a test body may produce as its result. `Debug` gives the
/// human-readable rendering; `as_any` gives typed access back.
pub trait Reportable: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug> Reportable for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Result value recorded on a completed unit.
pub type Value = Box<dyn Reportable>;

/// The constructed instance a case body is invoked against. Shared only
/// between a unit and its own in-flight body.
pub type Subject = Rc<dyn Any>;

/// Work produced by a test body that completes later. Resolves to the final
/// result value (or `None` for void) or to the underlying fault.
pub type Awaitable = LocalBoxFuture<'static, Result<Option<Value>, Error>>;

/// What invoking a case body produced.
pub enum Return {
    /// The body was void and finished.
    Done,
    /// The body finished with an immediate value.
    Value(Value),
    /// The body handed back work that completes later; the engine polls it
    /// cooperatively.
    Pending(Awaitable),
}

impl Return {
    /// An immediate result value.
    pub fn value<T: Reportable>(value: T) -> Return {
        Return::Value(Box::new(value))
    }

    /// Work that completes later.
    pub fn pending<F>(work: F) -> Return
    where
        F: Future<Output = Result<Option<Value>, Error>> + 'static,
    {
        Return::Pending(Box::pin(work))
    }
}

/// A case body: invoked with the unit's subject and the shared environment,
/// it either returns synchronously or hands back an [`Awaitable`]. A `?` or
/// panic inside the body becomes the unit's captured error.
pub type Body = Rc<dyn Fn(Subject, SharedEnv) -> Result<Return, Error>>;

/// One registered test case.
pub struct Case {
    /// Case name, unique within its suite by convention.
    pub name: String,
    pub(crate) body: Body,
}

/// How a suite's subject gets built. Resolution is a closed two-case policy:
/// a zero-argument constructor wins; otherwise the diagnostics-taking
/// constructor is invoked with a default [`Diagnostics`] adapter.
#[derive(Clone)]
pub(crate) enum Constructor {
    Plain(Rc<dyn Fn() -> Subject>),
    WithDiagnostics(Rc<dyn Fn(Diagnostics) -> Subject>),
}

impl Constructor {
    /// Build one subject. Constructor bodies run with full normal semantics
    /// and may themselves touch the environment.
    pub(crate) fn construct(&self) -> Subject {
        match self {
            Constructor::Plain(build) => build(),
            Constructor::WithDiagnostics(build) => build(Diagnostics::default()),
        }
    }
}

/// A named collection of cases sharing a subject type.
pub struct Suite {
    /// Name of this suite.
    pub name: String,
    plain: Option<Rc<dyn Fn() -> Subject>>,
    with_diagnostics: Option<Rc<dyn Fn(Diagnostics) -> Subject>>,
    cases: Vec<Case>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Suite {
            name: name.into(),
            plain: None,
            with_diagnostics: None,
            cases: Vec::new(),
        }
    }

    /// Register the zero-argument constructor for the subject.
    pub fn constructor<S, F>(mut self, build: F) -> Self
    where
        S: Any,
        F: Fn() -> S + 'static,
    {
        self.plain = Some(Rc::new(move || Rc::new(build()) as Subject));
        self
    }

    /// Register the constructor taking the diagnostic-output capability.
    /// Only used when no zero-argument constructor is registered.
    pub fn constructor_with_diagnostics<S, F>(mut self, build: F) -> Self
    where
        S: Any,
        F: Fn(Diagnostics) -> S + 'static,
    {
        self.with_diagnostics = Some(Rc::new(move |diag| Rc::new(build(diag)) as Subject));
        self
    }

    /// Register a case. Cases are discovered in registration order.
    pub fn case<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Subject, SharedEnv) -> Result<Return, Error> + 'static,
    {
        self.cases.push(Case {
            name: name.into(),
            body: Rc::new(body),
        });
        self
    }

    /// Discover this suite's cases, in registration order. Restartable:
    /// every call walks the full suite again.
    pub fn cases(&self) -> std::slice::Iter<'_, Case> {
        self.cases.iter()
    }

    pub(crate) fn resolve_constructor(&self) -> Result<Constructor, EngineError> {
        if let Some(build) = &self.plain {
            return Ok(Constructor::Plain(build.clone()));
        }
        if let Some(build) = &self.with_diagnostics {
            return Ok(Constructor::WithDiagnostics(build.clone()));
        }
        Err(EngineError::NoConstructor(self.name.clone()))
    }

    /// The execution iterator for this suite. Per advance it resets the
    /// environment, constructs a subject, calls `on_ready` with the pending
    /// unit, and yields the unit with its start trigger armed; the caller
    /// decides when to fire the trigger. Fails only when neither constructor
    /// form is registered, which fails discovery for this suite alone.
    pub fn units<F>(
        &self,
        env: SharedEnv,
        config: RunConfig,
        on_ready: F,
    ) -> Result<Units<'_, F>, EngineError>
    where
        F: FnMut(&Unit),
    {
        let constructor = self.resolve_constructor()?;
        Ok(Units::new(
            &self.name,
            self.cases.iter(),
            constructor,
            env,
            config,
            on_ready,
        ))
    }
}

/// Ordered collection of registered suites.
#[derive(Default)]
pub struct Registry {
    suites: Vec<Suite>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Add a suite to the registry.
    pub fn register(&mut self, suite: Suite) -> &mut Self {
        self.suites.push(suite);
        self
    }

    /// Look up a suite by name. An unknown name is the discovery error that
    /// propagates immediately.
    pub fn suite(&self, name: &str) -> Result<&Suite, EngineError> {
        self.suites
            .iter()
            .find(|suite| suite.name == name)
            .ok_or_else(|| EngineError::UnknownSuite(name.to_string()))
    }

    /// All registered suites, in registration order.
    pub fn suites(&self) -> std::slice::Iter<'_, Suite> {
        self.suites.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;

    #[derive(Debug, Default)]
    struct Plain;

    #[derive(Debug)]
    struct NeedsDiagnostics {
        diag: Diagnostics,
    }

    #[test]
    fn cases_discovered_in_registration_order() {
        let suite = Suite::new("ordering")
            .constructor(|| Plain)
            .case("first", |_, _| Ok(Return::Done))
            .case("second", |_, _| Ok(Return::Done))
            .case("third", |_, _| Ok(Return::Done));
        let names: Vec<&str> = suite.cases().map(|case| case.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        // Restartable: a second walk sees the same sequence.
        assert_eq!(suite.cases().count(), 3);
    }

    #[test]
    fn empty_suite_is_not_an_error() {
        let suite = Suite::new("empty").constructor(|| Plain);
        let env = Environment::shared();
        let units = suite.units(env, RunConfig::default(), |_| {}).unwrap();
        assert_eq!(units.count(), 0);
    }

    #[test]
    fn plain_constructor_preferred() {
        let suite = Suite::new("both")
            .constructor(|| Plain)
            .constructor_with_diagnostics(|diag| NeedsDiagnostics { diag });
        match suite.resolve_constructor().unwrap() {
            Constructor::Plain(build) => {
                assert!(build().downcast_ref::<Plain>().is_some());
            }
            Constructor::WithDiagnostics(_) => panic!("diagnostics constructor chosen"),
        }
    }

    #[test]
    fn diagnostics_constructor_receives_default_adapter() {
        let suite = Suite::new("diag")
            .constructor_with_diagnostics(|diag| NeedsDiagnostics { diag });
        let subject = suite.resolve_constructor().unwrap().construct();
        let built = subject.downcast_ref::<NeedsDiagnostics>().unwrap();
        built.diag.write_line("hello");
        assert_eq!(built.diag.lines(), vec!["hello"]);
    }

    #[test]
    fn missing_constructor_is_configuration_error() {
        let suite = Suite::new("bare").case("noop", |_, _| Ok(Return::Done));
        let env = Environment::shared();
        let err = suite
            .units(env, RunConfig::default(), |_: &Unit| {})
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::NoConstructor(name) if name == "bare"));
    }

    #[test]
    fn unknown_suite_lookup_fails() {
        let mut registry = Registry::new();
        registry.register(Suite::new("known").constructor(|| Plain));
        assert!(registry.suite("known").is_ok());
        let err = registry.suite("missing").err().unwrap();
        assert!(matches!(err, EngineError::UnknownSuite(name) if name == "missing"));
    }
}
