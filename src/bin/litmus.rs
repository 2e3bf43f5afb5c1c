use std::fs::{self, File};
use std::io::{self, BufWriter, IsTerminal as _, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand, value_parser};
use litmus_harness::report::{self, ScenarioReport};
use litmus_harness::summary::{self, Summary};
use litmus_harness::{
    DEFAULT_AVAILABLE_CONCURRENCY, Harness, Outcome, RoundedTestRunner, RunnerConfig, Scenario,
    WaitStrategy, catalog,
};
use log::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

#[derive(Debug)]
struct Options {
    cores: usize,
    config: RunnerConfig,
    filters: Vec<String>,
    list: bool,
    format: Format,
    output: Option<PathBuf>,
}

fn build_cli() -> ClapCommand {
    ClapCommand::new("litmus")
        .about("Runs memory-ordering litmus tests for many synchronized rounds.")
        .arg(
            Arg::new("cores")
                .help("How many cores the litmus threads may use. Scenarios needing more are skipped.")
                .value_parser(value_parser!(usize))
                .default_value("4"),
        )
        .arg(
            Arg::new("iterations")
                .long("iterations")
                .short('n')
                .help("Rounds per scenario.")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("settle_spins")
                .long("settle-spins")
                .help("Busy-loop iterations between a body and the exit barrier.")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("jitter")
                .long("jitter")
                .help("Up to this many extra settle iterations, random per round.")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed for the settle jitter.")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("pin")
                .long("pin")
                .help("Pin worker i to CPU i.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("yield_after")
                .long("yield-after")
                .help("Yield to the OS after this many barrier polls instead of spinning forever.")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .short('f')
                .help("Only run scenarios whose name contains this. May be repeated.")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .help("List the scenarios and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(format_arg())
        .arg(output_arg())
        .subcommand(
            ClapCommand::new("summarize")
                .about(
                    "Combines the text reports of several machines into a scenario by \
                     architecture table. The architecture is the file name without `_results`.",
                )
                .arg(
                    Arg::new("files")
                        .help("Text reports, one per architecture.")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(format_arg())
                .arg(output_arg()),
        )
}

fn format_arg() -> Arg {
    Arg::new("format")
        .long("format")
        .help("Output format.")
        .value_parser(["text", "json"])
        .default_value("text")
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .help("Write the report to this file instead of stdout.")
        .value_parser(value_parser!(PathBuf))
}

fn parse_format(matches: &ArgMatches) -> Result<Format> {
    let format = match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => Format::Json,
        _ => Format::Text,
    };
    if format == Format::Json && !cfg!(feature = "json") {
        bail!("`--format json` needs the `json` feature");
    }
    Ok(format)
}

/// The report destination, and whether it may be coloured.
fn open_output(path: Option<&PathBuf>) -> Result<(Box<dyn Write>, bool)> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create `{}`", path.display()))?;
            (Box::new(BufWriter::new(file)), false)
        }
        None => (Box::new(io::stdout().lock()), io::stdout().is_terminal()),
    })
}

fn parse_options(matches: &ArgMatches) -> Result<Options> {
    let defaults = RunnerConfig::default();
    let config = RunnerConfig {
        iterations: matches.get_one::<u64>("iterations").copied().unwrap_or(defaults.iterations),
        settle_spins: matches
            .get_one::<u32>("settle_spins")
            .copied()
            .unwrap_or(defaults.settle_spins),
        settle_jitter: matches.get_one::<u32>("jitter").copied().unwrap_or(defaults.settle_jitter),
        seed: matches.get_one::<u64>("seed").copied().unwrap_or(defaults.seed),
        pin_workers: matches.get_flag("pin"),
        wait: match matches.get_one::<u32>("yield_after") {
            Some(&spins) => WaitStrategy::SpinThenYield { spins },
            None => WaitStrategy::Spin,
        },
    };
    let format = parse_format(matches)?;
    Ok(Options {
        cores: matches.get_one::<usize>("cores").copied().unwrap_or(DEFAULT_AVAILABLE_CONCURRENCY),
        config,
        filters: matches.get_many::<String>("filter").unwrap_or_default().cloned().collect(),
        list: matches.get_flag("list"),
        format,
        output: matches.get_one::<PathBuf>("output").cloned(),
    })
}

fn init_logger() {
    // Quiet by default: the report goes to stdout, and nothing may be logged while
    // rounds are running anyway.
    let env = env_logger::Env::new()
        .filter_or("LITMUS_LOG", "warn")
        .write_style("LITMUS_LOG_STYLE");
    env_logger::init_from_env(env);
}

fn summarize(matches: &ArgMatches) -> Result<()> {
    let format = parse_format(matches)?;
    let mut runs: Vec<(String, _)> = Vec::new();
    for path in matches.get_many::<PathBuf>("files").unwrap_or_default() {
        let architecture = summary::architecture_name(path);
        if runs.iter().any(|(known, _)| *known == architecture) {
            bail!("more than one report for architecture `{architecture}`");
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let results = summary::parse_results(&text);
        debug!("{}: {} results for `{architecture}`", path.display(), results.len());
        runs.push((architecture, results));
    }
    let scenarios = catalog::catalog().context("failed to build the scenario catalog")?;
    let summary = Summary::build(scenarios.iter().map(Scenario::name), runs);

    let (mut out, _) = open_output(matches.get_one::<PathBuf>("output"))?;
    if format == Format::Text {
        summary::write_text(&mut out, &summary)?;
    }
    #[cfg(feature = "json")]
    {
        if format == Format::Json {
            summary::write_json(&mut out, &summary)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    init_logger();
    let matches = build_cli().get_matches();
    if let Some(matches) = matches.subcommand_matches("summarize") {
        return summarize(matches);
    }
    let options = parse_options(&matches)?;
    debug!("options: {options:?}");

    let scenarios = catalog::select(
        catalog::catalog().context("failed to build the scenario catalog")?,
        &options.filters,
    );

    let (mut out, color) = open_output(options.output.as_ref())?;

    if options.list {
        for scenario in &scenarios {
            writeln!(out, "{} ({} cores)", scenario.name(), scenario.required_concurrency())?;
        }
        out.flush()?;
        return Ok(());
    }

    let harness = Harness::new(RoundedTestRunner::new(options.config), options.cores);
    let mut reports = Vec::with_capacity(scenarios.len());
    if options.format == Format::Text {
        report::write_header(&mut out, harness.available_concurrency())?;
        out.flush()?;
    }
    for scenario in &scenarios {
        let outcome: Outcome = harness.execute(scenario);
        let report = ScenarioReport {
            name: scenario.name().to_owned(),
            required_concurrency: scenario.required_concurrency(),
            outcome,
        };
        if options.format == Format::Text {
            report::write_text(&mut out, &report, color)?;
            out.flush()?;
        }
        reports.push(report);
    }
    #[cfg(feature = "json")]
    {
        if options.format == Format::Json {
            report::write_json(&mut out, harness.available_concurrency(), &reports)?;
        }
    }
    out.flush()?;

    // Litmus failures are results, not errors: the exit status stays 0.
    Ok(())
}
