//! Runs the `litmus` binary end to end.

use std::process::{Command, Output};

use regex::Regex;

fn litmus(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_litmus"))
        .args(args)
        .env_remove("LITMUS_LOG")
        .output()
        .expect("failed to run litmus")
}

fn stdout(output: &Output) -> String {
    assert!(output.status.success(), "litmus failed: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn text_report_for_two_cores() {
    let output = litmus(&["2", "--iterations", "200", "--settle-spins", "16", "--yield-after", "256"]);
    let stdout = stdout(&output);
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("cores: 2"));

    let verdict = Regex::new(r"^(\w+): \[(\d+)/200\] (SUCCESS|FAIL)$").unwrap();
    let skip = Regex::new(r"^test (\w+) requires 4 cores, but only 2 are available$").unwrap();
    let (mut ran, mut skipped) = (Vec::new(), Vec::new());
    for line in lines {
        if let Some(caps) = verdict.captures(line) {
            let failed: u64 = caps[2].parse().unwrap();
            assert_eq!(failed == 0, &caps[3] == "SUCCESS", "{line}");
            ran.push(caps[1].to_owned());
        } else if let Some(caps) = skip.captures(line) {
            skipped.push(caps[1].to_owned());
        } else {
            panic!("unexpected line: {line}");
        }
    }
    assert_eq!(ran.len(), 10);
    assert_eq!(skipped, ["SeqCstAcqRel4", "SeqCst4"]);
}

#[test]
fn list_prints_every_scenario() {
    let stdout = stdout(&litmus(&["--list"]));
    assert_eq!(stdout.lines().count(), 12);
    assert!(stdout.lines().any(|line| line == "SeqCst4 (4 cores)"));
}

#[test]
fn filter_limits_the_run() {
    let stdout = stdout(&litmus(&[
        "--iterations",
        "100",
        "--yield-after",
        "256",
        "--filter",
        "Increment",
    ]));
    let names: Vec<_> =
        stdout.lines().skip(1).map(|line| line.split(':').next().unwrap()).collect();
    assert_eq!(names, ["IncrementRegular", "IncrementRelaxed", "IncrementSeqCst"]);
}

#[test]
fn json_report_written_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    let output = litmus(&[
        "1",
        "--iterations",
        "50",
        "--format",
        "json",
        "--output",
        path.to_str().unwrap(),
    ]);
    assert!(stdout(&output).is_empty());
    let report = std::fs::read_to_string(&path).unwrap();
    // Every scenario needs at least two cores, so with one core all are skipped.
    assert!(report.contains("\"cores\": 1"));
    assert_eq!(Regex::new(r#""status": "skipped""#).unwrap().find_iter(&report).count(), 12);
}

#[test]
fn bad_core_count_is_rejected() {
    let output = litmus(&["many"]);
    assert!(!output.status.success());
}

#[test]
fn summarize_combines_reports_per_architecture() {
    let dir = tempfile::tempdir().unwrap();
    let x86 = dir.path().join("x86_64_results");
    let output = litmus(&[
        "2",
        "--iterations",
        "100",
        "--settle-spins",
        "16",
        "--yield-after",
        "256",
        "--filter",
        "SeqCst",
        "--output",
        x86.to_str().unwrap(),
    ]);
    assert!(stdout(&output).is_empty());
    let mips = dir.path().join("mips_32_results");
    std::fs::write(&mips, "cores: 2\nIncrementSeqCst: [0/100] SUCCESS\nSeqCst2: [3/100] FAIL\n")
        .unwrap();

    let stdout =
        stdout(&litmus(&["summarize", x86.to_str().unwrap(), mips.to_str().unwrap()]));
    let rows: Vec<Vec<&str>> =
        stdout.lines().map(|line| line.split_whitespace().collect()).collect();
    assert_eq!(rows[0], ["scenario", "x86_64", "mips_32"]);
    // Every catalog scenario gets a row, in catalog order.
    assert_eq!(rows.len(), 13);
    let row = |name: &str| rows.iter().find(|row| row[0] == name).unwrap().clone();
    assert_eq!(row("IncrementSeqCst"), ["IncrementSeqCst", "S", "S"]);
    assert_eq!(row("SpinUseSeqCst"), ["SpinUseSeqCst", "S", "n"]);
    assert_eq!(row("SeqCst2"), ["SeqCst2", "S", "F"]);
    // Skipped on two cores, and filtered out of the run.
    assert_eq!(row("SeqCst4"), ["SeqCst4", "n", "n"]);
    assert_eq!(row("IncrementRegular"), ["IncrementRegular", "n", "n"]);
}

#[cfg(feature = "json")]
#[test]
fn summarize_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let arm = dir.path().join("arm8_64_results");
    std::fs::write(&arm, "cores: 4\nSeqCst4: [0/10] SUCCESS\nSpinUseRelaxed: [2/10] FAIL\n")
        .unwrap();
    let report = stdout(&litmus(&["summarize", "--format", "json", arm.to_str().unwrap()]));
    let value: serde_json::Value = serde_json::from_str(&report).unwrap();
    let arm = &value["architectures"][0];
    assert_eq!(arm["architecture"], "arm8_64");
    let cells = arm["cells"].as_array().unwrap();
    let cell = |name: &str| cells.iter().find(|cell| cell["scenario"] == name).unwrap();
    assert_eq!(cell("SeqCst4")["result"], "S");
    assert_eq!(cell("SpinUseRelaxed")["result"], "F");
    assert_eq!(cell("SpinUseRelaxed")["failed"], 2);
    assert_eq!(cell("SeqCst2")["result"], "n");
}

#[test]
fn summarize_rejects_two_reports_for_one_architecture() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a").join("x86_results");
    let second = dir.path().join("b").join("x86_results");
    for path in [&first, &second] {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "cores: 2\n").unwrap();
    }
    let output = litmus(&["summarize", first.to_str().unwrap(), second.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("x86"));
}
