//! Rendering verdicts.
//!
//! The text format is one line per scenario, `name: [failed/total] SUCCESS|FAIL`, or
//! a skip notice, preceded by a `cores: N` header.

use std::fmt;
use std::io::{self, Write};

use colored::Colorize as _;

use crate::harness::Outcome;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ScenarioReport {
    pub name: String,
    pub required_concurrency: usize,
    #[cfg_attr(feature = "json", serde(flatten))]
    pub outcome: Outcome,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Success => "SUCCESS",
            Verdict::Fail => "FAIL",
        })
    }
}

impl ScenarioReport {
    /// `None` for skipped scenarios.
    pub fn verdict(&self) -> Option<Verdict> {
        match self.outcome {
            Outcome::Completed(result) if result.passed() => Some(Verdict::Success),
            Outcome::Completed(_) => Some(Verdict::Fail),
            Outcome::Skipped { .. } => None,
        }
    }

    fn render(&self, color: bool) -> String {
        match self.outcome {
            Outcome::Completed(result) => {
                let verdict = if result.passed() { Verdict::Success } else { Verdict::Fail };
                let verdict = match verdict {
                    _ if !color => verdict.to_string().normal(),
                    Verdict::Success => verdict.to_string().green(),
                    Verdict::Fail => verdict.to_string().red(),
                };
                format!("{}: [{}/{}] {verdict}", self.name, result.failed, result.total)
            }
            Outcome::Skipped { required, available } => {
                let notice = format!(
                    "test {} requires {required} cores, but only {available} are available",
                    self.name
                );
                if color { notice.yellow().to_string() } else { notice }
            }
        }
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

pub fn write_header(out: &mut impl Write, available_concurrency: usize) -> io::Result<()> {
    writeln!(out, "cores: {available_concurrency}")
}

pub fn write_text(out: &mut impl Write, report: &ScenarioReport, color: bool) -> io::Result<()> {
    writeln!(out, "{}", report.render(color))
}

/// Writes all reports as one pretty-printed JSON document.
#[cfg(feature = "json")]
pub fn write_json(
    out: &mut impl Write,
    available_concurrency: usize,
    reports: &[ScenarioReport],
) -> io::Result<()> {
    #[derive(serde::Serialize)]
    struct Document<'a> {
        cores: usize,
        scenarios: &'a [ScenarioReport],
    }

    serde_json::to_writer_pretty(&mut *out, &Document { cores: available_concurrency, scenarios: reports })?;
    writeln!(out)
}
