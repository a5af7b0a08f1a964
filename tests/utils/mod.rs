// Integration test utilities
//
// A scripted stand-in for grcov and the LLVM tools, plus counter-file fixtures.

#![allow(dead_code)]

use covgate::error::Result;
use covgate::process::{CommandRunner, ToolCommand, ToolOutput};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Records every command; for grcov runs it writes `report` to the `-o` path
/// and remembers the directories it was pointed at
#[derive(Default)]
pub struct FakeGrcov {
    pub report: String,
    pub exit_code: i32,
    /// Skip writing the report even on success
    pub no_output: bool,
    pub calls: RefCell<Vec<ToolCommand>>,
    /// Counter files visible in each input dir at the time of the run
    pub seen_files: RefCell<Vec<Vec<String>>>,
}

impl FakeGrcov {
    pub fn with_report(report: &str) -> Self {
        Self {
            report: report.to_string(),
            ..Default::default()
        }
    }

    pub fn failing(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Input directories of the first call (args before `-o`)
    pub fn input_dirs(&self) -> Vec<PathBuf> {
        let calls = self.calls.borrow();
        let args = calls[0].arg_strings();
        args.iter()
            .take_while(|a| a.as_str() != "-o")
            .map(PathBuf::from)
            .collect()
    }
}

impl CommandRunner for FakeGrcov {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        self.calls.borrow_mut().push(command.clone());

        let inputs: Vec<String> = command
            .arg_strings()
            .into_iter()
            .take_while(|a| a != "-o")
            .collect();
        let mut seen = Vec::new();
        for dir in &inputs {
            if let Ok(entries) = fs::read_dir(dir) {
                let mut names: Vec<String> = entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect();
                names.sort();
                seen.extend(names);
            }
        }
        self.seen_files.borrow_mut().push(seen);

        if self.exit_code == 0 && !self.no_output {
            if let Some(out) = command.value_of("-o") {
                fs::write(out, &self.report)?;
            }
        }

        Ok(ToolOutput {
            exit_code: self.exit_code,
            ..Default::default()
        })
    }
}

/// One `ade` line for a method record
pub fn method_line(name: &str, covered: u64, uncovered: u64) -> String {
    format!(
        r#"{{"language":"c++","file":{{"name":"src/{name}.cpp"}},"method":{{"name":"{name}","covered":[],"uncovered":[],"total_covered":{covered},"total_uncovered":{uncovered},"percentage_covered":0.0}}}}"#
    )
}

/// The two-record report used by the filtering scenarios
pub fn scenario_report() -> String {
    [
        method_line("ns::Foo::bar", 10, 2),
        method_line("ns::Baz::qux", 5, 0),
    ]
    .join("\n")
}

/// Create a fake test binary with its gcno/gcda pair in `dir`
pub fn write_binary(dir: &Path, name: &str, with_data: bool) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let binary = dir.join(name);
    fs::write(&binary, "binary").unwrap();
    fs::write(dir.join(format!("{name}.gcno")), "notes").unwrap();
    if with_data {
        fs::write(dir.join(format!("{name}.gcda")), "data").unwrap();
    }
    binary
}
