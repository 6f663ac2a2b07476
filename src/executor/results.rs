use crate::{errors::EngineError, executor::Unit, registry::Value};

/// Terminal state of one executed unit.
#[derive(Debug)]
pub enum State {
    /// The body completed without raising. Holds the result value for
    /// non-void bodies.
    Passed(Option<Value>),
    /// The body completed with a captured failure. The original error is
    /// carried whole so the caller can downcast or re-raise it.
    Failed(anyhow::Error),
}

/// Outcome of one case, lifted off its completed unit.
#[derive(Debug)]
pub struct Case {
    /// Name of the suite that owns this case.
    pub suite: String,
    /// Name of the case.
    pub name: String,
    /// Terminal state.
    pub state: State,
}

impl From<Unit> for Case {
    fn from(unit: Unit) -> Self {
        let state = match unit.error {
            Some(error) => State::Failed(error),
            None => State::Passed(unit.result),
        };
        Case {
            suite: unit.suite,
            name: unit.case,
            state,
        }
    }
}

impl Case {
    /// Generate a colorized string to report this case's outcome.
    pub fn report_str(&self, with_suite: bool) -> String {
        use colored::*;

        let mut buf = String::new();
        match &self.state {
            State::Passed(value) => {
                buf.push_str(&"✓ ".green().to_string());
                if with_suite {
                    buf.push_str(&self.suite.bold().green().to_string());
                    buf.push_str(&":".green().to_string());
                }
                buf.push_str(&self.name.green().to_string());
                if let Some(value) = value {
                    buf.push_str(&format!(" ({:?})", value).dimmed().to_string());
                }
            }
            State::Failed(error) => {
                buf.push_str(&"✗ ".red().to_string());
                if with_suite {
                    buf.push_str(&self.suite.bold().red().to_string());
                    buf.push_str(&":".red().to_string());
                }
                buf.push_str(&self.name.red().to_string());
                buf.push_str(&format!(" ({})", error).dimmed().to_string());
            }
        }
        buf
    }
}

/// Result of running one suite.
pub struct Suite {
    /// Name of the suite.
    pub name: String,
    /// Outcomes for units that completed.
    pub cases: Vec<Case>,
    /// Engine errors while discovering or driving this suite.
    pub errors: Vec<EngineError>,
}

impl Suite {
    pub fn new(name: String) -> Self {
        Suite {
            name,
            cases: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Print the results of running this suite. Returns the rendered block
    /// together with the pass and fail counts.
    pub fn report_str(&self) -> (String, i32, i32) {
        use colored::*;

        let mut buf = String::with_capacity(500);
        let (mut pass, mut fail) = (0, 0);

        if !self.cases.is_empty() {
            buf.push_str(&format!(
                "{} ({} tests)\n",
                self.name.bold(),
                self.cases.len()
            ));
            for case in &self.cases {
                buf.push_str(&format!("  {}\n", case.report_str(false)));
                match case.state {
                    State::Passed(..) => pass += 1,
                    State::Failed(..) => fail += 1,
                }
            }
        }
        if !self.errors.is_empty() {
            buf.push_str(&format!("  {}\n", "engine errors".red()));
            for error in &self.errors {
                buf.push_str(&format!("    {}\n", error.to_string().red()));
            }
        }
        (buf, pass, fail)
    }
}

/// Render every suite's block followed by the aggregate tally line.
pub fn summary(suites: &[Suite]) -> (String, i32, i32) {
    use colored::*;

    let mut buf = String::new();
    let (mut pass, mut fail) = (0, 0);
    for suite in suites {
        let (block, suite_pass, suite_fail) = suite.report_str();
        buf.push_str(&block);
        pass += suite_pass;
        fail += suite_fail;
    }
    buf.push_str(&format!(
        "  {} / {}\n",
        format!("{} passing", pass).green(),
        format!("{} failing", fail).red()
    ));
    (buf, pass, fail)
}
