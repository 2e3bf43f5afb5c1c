//! Aggregating text reports from several machines.
//!
//! Each input is the text report of one run, usually saved as `<arch>_results`. The
//! summary is a scenario × architecture table of marks: `S` for a scenario that
//! never failed, `F` for one that failed at least once, and `n` for one the run did
//! not report, e.g. because the machine had too few cores.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::runner::TestResult;

static RESULT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+): \[(\d+)/(\d+)\]").expect("result line pattern is valid")
});

/// Reads every `name: [failed/total]` line of a text report. Header lines and skip
/// notices are ignored.
pub fn parse_results(text: &str) -> Vec<(String, TestResult)> {
    text.lines()
        .filter_map(|line| {
            let caps = RESULT_LINE.captures(line.trim())?;
            let failed = caps[2].parse().ok()?;
            let total = caps[3].parse().ok()?;
            Some((caps[1].to_owned(), TestResult { total, failed }))
        })
        .collect()
}

/// The architecture a results file belongs to: its file name without a trailing
/// `_results`.
pub fn architecture_name(path: &Path) -> String {
    let file_name = path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
    if let Some(arch) = file_name.strip_suffix("_results").filter(|arch| !arch.is_empty()) {
        return arch.to_owned();
    }
    file_name.into_owned()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub enum Mark {
    #[cfg_attr(feature = "json", serde(rename = "S"))]
    Success,
    #[cfg_attr(feature = "json", serde(rename = "F"))]
    Fail,
    #[cfg_attr(feature = "json", serde(rename = "n"))]
    NotRun,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mark::Success => "S",
            Mark::Fail => "F",
            Mark::NotRun => "n",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Cell {
    pub scenario: String,
    pub result: Mark,
    #[cfg_attr(feature = "json", serde(flatten))]
    pub run: Option<TestResult>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Column {
    pub architecture: String,
    pub cells: Vec<Cell>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Summary {
    pub scenarios: Vec<String>,
    pub architectures: Vec<Column>,
}

impl Summary {
    /// Builds the table from `(architecture, results)` pairs.
    ///
    /// Rows follow `order`; scenarios that only appear in the results are appended in
    /// the order they are first seen. A scenario reported twice for one architecture
    /// keeps its last result.
    pub fn build<'a>(
        order: impl IntoIterator<Item = &'a str>,
        runs: Vec<(String, Vec<(String, TestResult)>)>,
    ) -> Self {
        let mut scenarios: Vec<String> = order.into_iter().map(str::to_owned).collect();
        for (_, results) in &runs {
            for (name, _) in results {
                if !scenarios.contains(name) {
                    scenarios.push(name.clone());
                }
            }
        }
        let architectures = runs
            .into_iter()
            .map(|(architecture, results)| {
                let by_name: HashMap<String, TestResult> = results.into_iter().collect();
                let cells = scenarios
                    .iter()
                    .map(|scenario| {
                        let run = by_name.get(scenario).copied();
                        let result = match run {
                            Some(run) if run.passed() => Mark::Success,
                            Some(_) => Mark::Fail,
                            None => Mark::NotRun,
                        };
                        Cell { scenario: scenario.clone(), result, run }
                    })
                    .collect();
                Column { architecture, cells }
            })
            .collect();
        Self { scenarios, architectures }
    }

    pub fn mark(&self, architecture: &str, scenario: &str) -> Option<Mark> {
        let column =
            self.architectures.iter().find(|column| column.architecture == architecture)?;
        let cell = column.cells.iter().find(|cell| cell.scenario == scenario)?;
        Some(cell.result)
    }
}

/// Writes the table with one row per scenario and one column per architecture.
pub fn write_text(out: &mut impl Write, summary: &Summary) -> io::Result<()> {
    let name_width =
        summary.scenarios.iter().map(String::len).chain(["scenario".len()]).max().unwrap_or(0);
    let widths: Vec<usize> =
        summary.architectures.iter().map(|column| column.architecture.len()).collect();

    let mut line = format!("{:<name_width$}", "scenario");
    for (column, width) in summary.architectures.iter().zip(widths.iter().copied()) {
        line.push_str(&format!("  {:<width$}", column.architecture));
    }
    writeln!(out, "{}", line.trim_end())?;

    for (row, scenario) in summary.scenarios.iter().enumerate() {
        let mut line = format!("{scenario:<name_width$}");
        for (column, width) in summary.architectures.iter().zip(widths.iter().copied()) {
            line.push_str(&format!("  {:<width$}", column.cells[row].result.to_string()));
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

#[cfg(feature = "json")]
pub fn write_json(out: &mut impl Write, summary: &Summary) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, summary)?;
    writeln!(out)
}
