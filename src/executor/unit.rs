use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    task::Poll,
    time::{Duration, Instant},
};

use anyhow::anyhow;
use futures::{future::FutureExt, pin_mut, poll};
use tokio::time;

use crate::{
    config::RunConfig,
    env::{LogSink, SharedEnv},
    errors::EngineError,
    registry::{Awaitable, Body, Return, Subject, Value},
};

/// Where a unit is in its lifecycle. Transitions are strictly
/// pending → running → completed and never reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed and reset, start trigger not yet fired.
    Pending,
    /// The body (or its awaitable continuation) is in flight.
    Running,
    /// The body finished; exactly one of result/error is recorded, or
    /// neither for a void success.
    Completed,
}

/// One discovered test: its subject, its armed start trigger, and — after
/// completion — its outcome.
///
/// The engine never starts a unit on its own. [`Unit::start`] is the start
/// trigger; the future it returns is the opaque running handle, and the
/// caller decides on which turn to drive it. The trigger fires exactly once.
pub struct Unit {
    /// Name of the owning suite.
    pub suite: String,
    /// Name of the discovered case.
    pub case: String,
    /// The constructed instance the body is invoked against. Owned by this
    /// unit; one per unit, never shared across units.
    pub subject: Subject,
    /// Value the body completed with, for non-void successes.
    pub result: Option<Value>,
    /// The original failure, captured rather than stringified: its concrete
    /// kind stays reachable through `downcast_ref`, and the error can be
    /// re-raised by the caller.
    pub error: Option<anyhow::Error>,
    env: SharedEnv,
    trigger: Option<Body>,
    phase: Phase,
    tick: Duration,
    timeout: Option<Duration>,
}

impl Unit {
    pub(crate) fn new(
        suite: String,
        case: String,
        subject: Subject,
        env: SharedEnv,
        config: RunConfig,
        body: Body,
    ) -> Self {
        Unit {
            suite,
            case,
            subject,
            result: None,
            error: None,
            env,
            trigger: Some(body),
            phase: Phase::Pending,
            tick: config.tick,
            timeout: config.timeout,
        }
    }

    /// `suite:case` identity of this unit.
    pub fn id(&self) -> String {
        format!("{}:{}", self.suite, self.case)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Fire the start trigger and run the body to completion.
    ///
    /// Yields one tick before beginning so pending setup from sibling
    /// operations can settle, checks the environment precondition, invokes
    /// the body, and cooperatively polls any returned awaitable at tick
    /// intervals until it completes or the configured timeout elapses. Every
    /// failure mode is captured on the unit; the returned `Result` only
    /// reports firing the trigger a second time.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        let body = self
            .trigger
            .take()
            .ok_or_else(|| EngineError::TriggerAlreadyFired { name: self.id() })?;
        self.phase = Phase::Running;

        time::sleep(self.tick).await;

        let sink = self.env.borrow().log_sink();
        if sink != LogSink::Host {
            self.error = Some(
                EngineError::UnexpectedLogSink {
                    found: sink,
                    expected: LogSink::Host,
                }
                .into(),
            );
            self.phase = Phase::Completed;
            return Ok(());
        }

        let invoked =
            panic::catch_unwind(AssertUnwindSafe(|| body(self.subject.clone(), self.env.clone())));
        match invoked {
            Err(payload) => self.error = Some(panic_cause(payload)),
            Ok(Err(err)) => self.error = Some(err),
            Ok(Ok(Return::Done)) => {}
            Ok(Ok(Return::Value(value))) => self.result = Some(value),
            Ok(Ok(Return::Pending(work))) => {
                let completed = self.poll_to_completion(work).await;
                match completed {
                    Ok(value) => self.result = value,
                    Err(err) => self.error = Some(err),
                }
            }
        }
        self.phase = Phase::Completed;
        Ok(())
    }

    /// Spin-poll `work` at tick intervals without blocking, so the calling
    /// context stays free to interleave other work between polls.
    async fn poll_to_completion(&self, work: Awaitable) -> Result<Option<Value>, anyhow::Error> {
        let started = Instant::now();
        let work = AssertUnwindSafe(work).catch_unwind();
        pin_mut!(work);
        loop {
            match poll!(work.as_mut()) {
                Poll::Ready(Ok(completed)) => return completed,
                Poll::Ready(Err(payload)) => return Err(panic_cause(payload)),
                Poll::Pending => {
                    if let Some(timeout) = self.timeout {
                        if started.elapsed() >= timeout {
                            return Err(EngineError::Timeout {
                                name: self.id(),
                                timeout,
                            }
                            .into());
                        }
                    }
                    time::sleep(self.tick).await;
                }
            }
        }
    }
}

/// Unwrap the one level of wrapping the invocation mechanism introduces
/// around a panicking body, keeping the original payload message.
fn panic_cause(payload: Box<dyn Any + Send>) -> anyhow::Error {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        anyhow!("{}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        anyhow!("{}", msg)
    } else {
        anyhow!("test body panicked with a non-string payload")
    }
}

impl fmt::Display for Unit {
    /// Method identity plus whichever of result/error is present.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id())?;
        if let Some(value) = &self.result {
            write!(f, ": {:?}", value)?;
        }
        if let Some(error) = &self.error {
            write!(f, ": {}", error)?;
        }
        Ok(())
    }
}
