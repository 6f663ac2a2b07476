//! Attest is a lightweight, single-threaded test execution engine with
//! deferred start triggers and cooperative polling.
//!
//! Tests are organized into suites. A suite registers a name, one or two
//! subject constructors, and a list of named case bodies; no runtime
//! reflection is involved. The engine walks a suite's cases in registration
//! order and produces one *execution unit* per case.
//!
//! ## Execution model
//!
//! Discovery and setup are eager, the run is deferred. Advancing the
//! execution iterator resets the shared [environment](env::Environment)
//! (fresh event hub, fresh injection root, host default singletons),
//! constructs a subject through the suite's constructor policy, and notifies
//! the caller that the unit is ready. The unit itself stays pending until
//! the caller fires its one-shot start trigger, so a host that only permits
//! work on specific turns — a frame loop, say — can schedule each start
//! itself.
//!
//! Once started, a unit yields briefly, checks that the environment's active
//! log sink is the host-bound kind, and invokes its body. A body that hands
//! back deferred work is polled at a fixed interval without ever blocking
//! the calling context; a configurable timeout bounds how long it may stay
//! pending. Whatever goes wrong — a returned error, a panic, a faulted
//! awaitable, a missed precondition — is captured on the unit with its
//! original kind and message intact, never re-thrown past the engine.
//!
//! ## Example
//!
//! ```no_run
//! use attest::{
//!     config::RunConfig,
//!     env::Environment,
//!     registry::{Return, Suite},
//! };
//!
//! # async fn demo() -> Result<(), attest::errors::EngineError> {
//! let suite = Suite::new("arithmetic")
//!     .constructor(|| ())
//!     .case("answer", |_subject, _env| Ok(Return::value(42_i32)));
//!
//! let env = Environment::shared();
//! let mut units = suite.units(env, RunConfig::default(), |unit| {
//!     println!("ready: {}", unit.id());
//! })?;
//! while let Some(mut unit) = units.next() {
//!     unit.start().await?;
//!     println!("{}", unit);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! For whole-registry runs there is [`executor::Context`], which starts each
//! unit as soon as it is ready and renders a colorized summary through
//! [`executor::results`].
pub mod config;
pub mod env;
pub mod errors;
pub mod executor;
pub mod registry;
