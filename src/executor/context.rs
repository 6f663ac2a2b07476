use crate::{
    config::RunConfig,
    env::{Environment, SharedEnv},
    errors::EngineError,
    executor::results,
    registry::{Registry, Suite},
};

/// A context owns the registry, the shared environment, and the run
/// configuration, and drives suites to completion one unit at a time. Units
/// are started as soon as they are yielded; hosts that need to schedule
/// starts on specific turns should use [`Suite::units`] directly.
pub struct Context {
    registry: Registry,
    env: SharedEnv,
    config: RunConfig,
}

impl Context {
    pub fn new(registry: Registry, config: RunConfig) -> Self {
        Context {
            registry,
            env: Environment::shared(),
            config,
        }
    }

    /// Handle to the environment this context's units run against.
    pub fn env(&self) -> SharedEnv {
        self.env.clone()
    }

    /// Run one suite by name to completion.
    pub async fn run_suite(&self, name: &str) -> Result<results::Suite, EngineError> {
        let suite = self.registry.suite(name)?;
        Ok(self.run(suite).await)
    }

    /// Run every registered suite sequentially. A suite that fails discovery
    /// records its error and does not abort the others.
    pub async fn run_all(&self) -> Vec<results::Suite> {
        let mut all = Vec::new();
        for suite in self.registry.suites() {
            all.push(self.run(suite).await);
        }
        all
    }

    async fn run(&self, suite: &Suite) -> results::Suite {
        let mut collected = results::Suite::new(suite.name.clone());
        match suite.units(self.env.clone(), self.config, |_| {}) {
            Err(err) => collected.errors.push(err),
            Ok(mut units) => {
                while let Some(mut unit) = units.next() {
                    match unit.start().await {
                        Ok(()) => collected.cases.push(results::Case::from(unit)),
                        Err(err) => collected.errors.push(err),
                    }
                }
            }
        }
        collected
    }
}
