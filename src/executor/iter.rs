use std::slice;

use crate::{
    config::RunConfig,
    env::SharedEnv,
    executor::Unit,
    registry::{Case, Constructor},
};

/// Lazy, single-pass sequence of [`Unit`]s for one suite, created through
/// [`Suite::units`].
///
/// Each advance performs the eager half of a test's lifecycle: the
/// environment reset, subject construction, and the synchronous `on_ready`
/// notification, in that order. The yielded unit is pending with its start
/// trigger armed; this iterator never fires it, so a host that only permits
/// work on specific turns can schedule starts itself.
///
/// [`Suite::units`]: crate::registry::Suite::units
pub struct Units<'s, F> {
    suite: &'s str,
    cases: slice::Iter<'s, Case>,
    constructor: Constructor,
    env: SharedEnv,
    config: RunConfig,
    on_ready: F,
}

impl<'s, F> Units<'s, F> {
    pub(crate) fn new(
        suite: &'s str,
        cases: slice::Iter<'s, Case>,
        constructor: Constructor,
        env: SharedEnv,
        config: RunConfig,
        on_ready: F,
    ) -> Self {
        Units {
            suite,
            cases,
            constructor,
            env,
            config,
            on_ready,
        }
    }
}

impl<'s, F: FnMut(&Unit)> Iterator for Units<'s, F> {
    type Item = Unit;

    fn next(&mut self) -> Option<Unit> {
        let case = self.cases.next()?;
        // Reset first: the constructor runs with full normal semantics and
        // may itself touch the freshly reset environment.
        self.env.borrow_mut().reset();
        let subject = self.constructor.construct();
        let unit = Unit::new(
            self.suite.to_string(),
            case.name.clone(),
            subject,
            self.env.clone(),
            self.config,
            case.body.clone(),
        );
        (self.on_ready)(&unit);
        Some(unit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cases.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        env::Environment,
        executor::Phase,
        registry::{Return, Suite},
    };
    use std::{cell::RefCell, rc::Rc};

    #[derive(Debug, Default)]
    struct Probe;

    fn three_case_suite() -> Suite {
        Suite::new("probe")
            .constructor(|| Probe)
            .case("a", |_, _| Ok(Return::Done))
            .case("b", |_, _| Ok(Return::Done))
            .case("c", |_, _| Ok(Return::Done))
    }

    #[test]
    fn yields_every_case_in_discovery_order() {
        let suite = three_case_suite();
        let env = Environment::shared();
        let ready: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let seen = ready.clone();

        let units: Vec<Unit> = suite
            .units(env, RunConfig::default(), move |unit| {
                seen.borrow_mut().push(unit.id())
            })
            .unwrap()
            .collect();

        assert_eq!(units.len(), 3);
        assert_eq!(
            *ready.borrow(),
            vec!["probe:a", "probe:b", "probe:c"]
        );
        // Deferred start: nothing has run yet.
        assert!(units.iter().all(|unit| unit.phase() == Phase::Pending));
    }

    #[test]
    fn on_ready_sees_a_reset_pending_unit() {
        let suite = three_case_suite();
        let env = Environment::shared();
        env.borrow_mut().hub.subscribe("leak", || {});
        let observed: Rc<RefCell<Vec<(Phase, usize, u64)>>> = Rc::new(RefCell::new(Vec::new()));

        let seen = observed.clone();
        let hub_env = env.clone();
        let count = suite
            .units(env.clone(), RunConfig::default(), move |unit| {
                let env = hub_env.borrow();
                seen.borrow_mut().push((
                    unit.phase(),
                    env.hub.subscriber_count("leak"),
                    env.generation(),
                ));
            })
            .unwrap()
            .count();

        assert_eq!(count, 3);
        let observed = observed.borrow();
        // The pre-existing subscriber is gone by the first notification, and
        // every advance applied exactly one further reset.
        assert_eq!(
            *observed,
            vec![
                (Phase::Pending, 0, 1),
                (Phase::Pending, 0, 2),
                (Phase::Pending, 0, 3)
            ]
        );
    }

    #[tokio::test]
    async fn bodies_never_observe_a_prior_units_state() {
        let suite = Suite::new("isolated")
            .constructor(|| Probe)
            .case("first", |_, env| {
                let mut env = env.borrow_mut();
                assert_eq!(env.hub.subscriber_count("saved"), 0);
                env.hub.subscribe("saved", || {});
                env.injector.set_singleton("first's leftovers".to_string());
                Ok(Return::Done)
            })
            .case("second", |_, env| {
                let env = env.borrow();
                assert_eq!(env.hub.subscriber_count("saved"), 0);
                assert!(env.injector.get_singleton::<String>().is_none());
                Ok(Return::Done)
            });

        let env = Environment::shared();
        let config = RunConfig {
            tick: std::time::Duration::from_millis(1),
            ..RunConfig::default()
        };
        let mut units = suite.units(env, config, |_| {}).unwrap();
        while let Some(mut unit) = units.next() {
            unit.start().await.unwrap();
            assert!(unit.error.is_none(), "{}", unit);
        }
    }

    #[test]
    fn restartable_per_call() {
        let suite = three_case_suite();
        let env = Environment::shared();
        let first = suite
            .units(env.clone(), RunConfig::default(), |_| {})
            .unwrap()
            .count();
        let second = suite
            .units(env, RunConfig::default(), |_| {})
            .unwrap()
            .count();
        assert_eq!((first, second), (3, 3));
    }
}
