//! Code-structure analysis: find function and class definitions and
//! whether they carry documentation.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// A function or class definition found in a source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeItem {
    pub name: String,
    /// 1-based line of the definition.
    pub line: usize,
    pub has_docstring: bool,
}

/// Definitions found in one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructureReport {
    pub functions: Vec<CodeItem>,
    pub classes: Vec<CodeItem>,
}

impl StructureReport {
    /// Items still missing documentation, functions first.
    pub fn undocumented(&self) -> Vec<&CodeItem> {
        self.functions
            .iter()
            .chain(self.classes.iter())
            .filter(|item| !item.has_docstring)
            .collect()
    }
}

/// Documentation coverage aggregated over a whole repository.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DocCoverage {
    pub functions: usize,
    pub classes: usize,
    pub documented: usize,
    pub undocumented: usize,
}

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:def|function)\s+(\w+)\s*\(").expect("valid regex"))
}

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*class\s+(\w+)").expect("valid regex"))
}

/// Scan source text for function and class definitions, noting whether a
/// docstring opens within the three lines following each definition.
pub fn analyze_code_structure(code: &str) -> StructureReport {
    let lines: Vec<&str> = code.lines().collect();
    let mut report = StructureReport::default();

    for (idx, line) in lines.iter().enumerate() {
        if let Some(caps) = function_re().captures(line) {
            report.functions.push(CodeItem {
                name: caps[1].to_string(),
                line: idx + 1,
                has_docstring: has_docstring_after(&lines, idx),
            });
        } else if let Some(caps) = class_re().captures(line) {
            report.classes.push(CodeItem {
                name: caps[1].to_string(),
                line: idx + 1,
                has_docstring: has_docstring_after(&lines, idx),
            });
        }
    }

    report
}

fn has_docstring_after(lines: &[&str], idx: usize) -> bool {
    lines
        .iter()
        .skip(idx + 1)
        .take(3)
        .any(|line| line.contains("\"\"\"") || line.contains("'''"))
}

/// Aggregate structure reports over all files of a repository.
pub fn documentation_coverage<'a>(contents: impl IntoIterator<Item = &'a str>) -> DocCoverage {
    let mut coverage = DocCoverage::default();
    for code in contents {
        let report = analyze_code_structure(code);
        for item in report.functions.iter().chain(report.classes.iter()) {
            if item.has_docstring {
                coverage.documented += 1;
            } else {
                coverage.undocumented += 1;
            }
        }
        coverage.functions += report.functions.len();
        coverage.classes += report.classes.len();
    }
    coverage
}
