//! CI log analysis: parse pytest failures out of raw workflow logs and
//! diagnose likely root causes (missing system or Python dependencies).
//!
//! All of this is heuristic pattern matching over untrusted text. The parsers
//! never fail; an unrecognized log simply yields an empty, low-confidence
//! diagnosis.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

/// One pytest failure pulled out of a log.
#[derive(Debug, Clone, Serialize)]
pub struct TestFailure {
    pub test_name: String,
    pub error_type: String,
    pub error_message: String,
    pub traceback: Vec<String>,
    pub file_path: Option<String>,
    pub line_number: Option<u32>,
}

/// How much to trust the diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl FixKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FixKind::Config => "config",
            FixKind::Workflow => "workflow",
            FixKind::Dependencies => "dependencies",
        }
    }
}

/// What a proposed fix touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixKind {
    Config,
    Workflow,
    Dependencies,
}

/// A concrete remediation suggestion attached to a diagnosis.
#[derive(Debug, Clone, Serialize)]
pub struct ProposedFix {
    pub kind: FixKind,
    pub description: String,
    pub action: String,
    pub packages: Vec<String>,
}

/// Full result of analyzing one CI log.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    pub failures: Vec<TestFailure>,
    pub missing_system_deps: Vec<String>,
    pub missing_python_deps: Vec<String>,
    pub config_issues: Vec<String>,
    pub proposed_fixes: Vec<ProposedFix>,
    pub confidence: Confidence,
}

fn traceback_regex() -> Regex {
    Regex::new(r#"File\s+"(.+?)",\s+line\s+(\d+)"#).expect("regex for traceback frames")
}

/// Error-message signatures that point at a missing system package.
const SYSTEM_DEP_SIGNATURES: &[(&str, &[&str])] = &[
    (
        "unixodbc",
        &[
            r"Can't open lib.*ODBC.*Driver",
            r"libodbc.*not found",
            r"ODBC.*driver.*not found",
        ],
    ),
    ("msodbcsql17", &[r"ODBC Driver 17 for SQL Server.*not found"]),
    ("msodbcsql18", &[r"ODBC Driver 18 for SQL Server.*not found"]),
    ("ffmpeg", &[r"ffmpeg.*not found", r"libav.*not found"]),
    ("libsndfile", &[r"libsndfile.*not found", r"sndfile.*not found"]),
    ("portaudio", &[r"portaudio.*not found", r"libportaudio.*not found"]),
];

/// Parse pytest failure summaries out of a CI log.
///
/// The strict pattern runs first; the looser fallback only reports tests the
/// strict pass did not already claim, so each test name appears at most once.
pub fn parse_test_failures(logs: &str) -> Vec<TestFailure> {
    // `FAILED <test> - <ErrorType>: <message>`, with a looser form as backup.
    let strict = Regex::new(r"(?m)^FAILED\s+(.+?)\s+-\s+(.+?):\s+(.+)$")
        .expect("regex for pytest failures");
    let fallback =
        Regex::new(r"(?m)^FAILED\s+(.+?)\s+-\s+(.+)$").expect("regex for fallback failures");

    let mut failures = Vec::new();
    let mut seen = BTreeSet::new();

    for m in strict.captures_iter(logs) {
        let whole = m.get(0).expect("capture 0");
        let test_name = m[1].to_string();
        seen.insert(test_name.clone());
        failures.push(build_failure(
            logs,
            whole.start(),
            whole.end(),
            test_name,
            m[2].to_string(),
            m[3].to_string(),
        ));
    }

    for m in fallback.captures_iter(logs) {
        let test_name = &m[1];
        if seen.contains(test_name) {
            continue;
        }
        let whole = m.get(0).expect("capture 0");
        let info = &m[2];
        let (error_type, error_message) = match info.split_once(": ") {
            Some((kind, message)) => (kind.to_string(), message.to_string()),
            None => (info.to_string(), String::new()),
        };
        failures.push(build_failure(
            logs,
            whole.start(),
            whole.end(),
            test_name.to_string(),
            error_type,
            error_message,
        ));
    }

    failures
}

fn build_failure(
    logs: &str,
    match_start: usize,
    match_end: usize,
    test_name: String,
    error_type: String,
    error_message: String,
) -> TestFailure {
    // Traceback frames usually sit within a couple of KB of the summary line.
    let start = floor_char_boundary(logs, match_start.saturating_sub(1000));
    let end = ceil_char_boundary(logs, (match_end + 2000).min(logs.len()));
    let context = &logs[start..end];

    let mut traceback = Vec::new();
    let mut file_path = None;
    let mut line_number = None;
    for tb in traceback_regex().captures_iter(context) {
        let path = tb[1].to_string();
        let line: u32 = tb[2].parse().unwrap_or(0);
        traceback.push(format!("  File \"{path}\", line {line}"));
        file_path = Some(path);
        line_number = Some(line);
    }

    TestFailure {
        test_name,
        error_type,
        error_message,
        traceback,
        file_path,
        line_number,
    }
}

// Byte offsets computed from match positions can land inside a multi-byte
// character once we add fixed context windows; walk to a real boundary.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// System packages whose absence signatures appear in the log or in the
/// parsed failure messages. Sorted and deduplicated.
pub fn missing_system_deps(failures: &[TestFailure], logs: &str) -> Vec<String> {
    let mut all_text = logs.to_string();
    all_text.push('\n');
    for failure in failures {
        all_text.push_str(&failure.error_message);
        all_text.push('\n');
    }

    let mut missing = BTreeSet::new();
    for (package, signatures) in SYSTEM_DEP_SIGNATURES {
        for signature in *signatures {
            let re = Regex::new(&format!("(?i){signature}"))
                .expect("regex for system dep signature");
            if re.is_match(&all_text) {
                missing.insert((*package).to_string());
                break;
            }
        }
    }
    missing.into_iter().collect()
}

/// Top-level Python packages named in `ModuleNotFoundError` messages.
pub fn missing_python_deps(failures: &[TestFailure]) -> Vec<String> {
    let module_not_found = Regex::new(r"ModuleNotFoundError: No module named '(.+?)'")
        .expect("regex for missing modules");

    let mut missing = BTreeSet::new();
    for failure in failures {
        if let Some(m) = module_not_found.captures(&failure.error_message) {
            let module = m[1].split('.').next().unwrap_or(&m[1]).to_string();
            missing.insert(module);
        }
    }
    missing.into_iter().collect()
}

/// Analyze one CI log end to end.
///
/// Confidence is high when a concrete missing dependency was identified,
/// medium when failures were parsed but not attributed, low otherwise.
pub fn diagnose(logs: &str) -> Diagnosis {
    let failures = parse_test_failures(logs);
    let missing_system = missing_system_deps(&failures, logs);
    let missing_python = missing_python_deps(&failures);

    let mut config_issues = Vec::new();
    let mut proposed_fixes = Vec::new();

    if !missing_system.is_empty() {
        config_issues.push(format!(
            "Missing system dependencies: {}",
            missing_system.join(", ")
        ));
        proposed_fixes.push(ProposedFix {
            kind: FixKind::Config,
            description: "Add missing system dependencies to pyproject.toml".to_string(),
            action: "Add [external] and [tool.wads.external.ops] sections".to_string(),
            packages: missing_system.clone(),
        });
        proposed_fixes.push(ProposedFix {
            kind: FixKind::Workflow,
            description: "Add system dependency installation to CI workflow".to_string(),
            action: "Add installation step before tests".to_string(),
            packages: missing_system.clone(),
        });
    }

    if !missing_python.is_empty() {
        config_issues.push(format!(
            "Missing Python dependencies: {}",
            missing_python.join(", ")
        ));
        proposed_fixes.push(ProposedFix {
            kind: FixKind::Dependencies,
            description: "Add missing Python packages to pyproject.toml".to_string(),
            action: "Add to [project.dependencies] or [project.optional-dependencies]"
                .to_string(),
            packages: missing_python.clone(),
        });
    }

    let confidence = if !missing_system.is_empty() || !missing_python.is_empty() {
        Confidence::High
    } else if !failures.is_empty() {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    Diagnosis {
        failures,
        missing_system_deps: missing_system,
        missing_python_deps: missing_python,
        config_issues,
        proposed_fixes,
        confidence,
    }
}

/// Human-readable diagnosis report.
pub fn render_diagnosis(diagnosis: &Diagnosis) -> String {
    let bar = "=".repeat(70);
    let mut lines = vec![
        bar.clone(),
        "CI FAILURE DIAGNOSIS".to_string(),
        bar.clone(),
        String::new(),
        format!("Confidence: {}", diagnosis.confidence.as_str().to_uppercase()),
    ];

    if !diagnosis.failures.is_empty() {
        lines.push(String::new());
        lines.push(format!("Test Failures ({}):", diagnosis.failures.len()));
        for (index, failure) in diagnosis.failures.iter().take(5).enumerate() {
            lines.push(String::new());
            lines.push(format!("{}. {}", index + 1, failure.test_name));
            lines.push(format!("   Error: {}", failure.error_type));
            let message: String = failure.error_message.chars().take(200).collect();
            lines.push(format!("   Message: {message}"));
            if let (Some(path), Some(line)) = (&failure.file_path, failure.line_number) {
                lines.push(format!("   Location: {path}:{line}"));
            }
        }
        if diagnosis.failures.len() > 5 {
            lines.push(String::new());
            lines.push(format!(
                "   ... and {} more failures",
                diagnosis.failures.len() - 5
            ));
        }
    }

    if !diagnosis.missing_system_deps.is_empty() {
        lines.push(String::new());
        lines.push("Missing System Dependencies:".to_string());
        for dep in &diagnosis.missing_system_deps {
            lines.push(format!("  - {dep}"));
        }
    }

    if !diagnosis.missing_python_deps.is_empty() {
        lines.push(String::new());
        lines.push("Missing Python Dependencies:".to_string());
        for dep in &diagnosis.missing_python_deps {
            lines.push(format!("  - {dep}"));
        }
    }

    if !diagnosis.config_issues.is_empty() {
        lines.push(String::new());
        lines.push("Configuration Issues:".to_string());
        for issue in &diagnosis.config_issues {
            lines.push(format!("  - {issue}"));
        }
    }

    if !diagnosis.proposed_fixes.is_empty() {
        lines.push(String::new());
        lines.push("Proposed Fixes:".to_string());
        for (index, fix) in diagnosis.proposed_fixes.iter().enumerate() {
            lines.push(String::new());
            lines.push(format!("{}. {}", index + 1, fix.description));
            lines.push(format!("   Type: {}", fix.kind.as_str()));
            lines.push(format!("   Action: {}", fix.action));
            if !fix.packages.is_empty() {
                lines.push(format!("   Packages: {}", fix.packages.join(", ")));
            }
        }
    }

    lines.push(String::new());
    lines.push(bar);
    lines.join("\n")
}

/// Remediation playbook for a diagnosis: the PEP 725 declaration to add, the
/// equivalent manual workflow step, and any missing Python packages.
pub fn fix_instructions(diagnosis: &Diagnosis) -> String {
    let bar = "=".repeat(70);
    let mut lines = vec![bar.clone(), "FIX INSTRUCTIONS".to_string(), bar.clone(), String::new()];

    if !diagnosis.missing_system_deps.is_empty() {
        lines.push("## Fix System Dependencies".to_string());
        lines.push(String::new());
        lines.push("### Option 1: Use PEP 725 format (recommended)".to_string());
        lines.push(String::new());
        lines.push("Add to your `pyproject.toml`:".to_string());
        lines.push(String::new());
        lines.push("[external]".to_string());
        lines.push("host-requires = [".to_string());
        for dep in &diagnosis.missing_system_deps {
            lines.push(format!("    \"dep:generic/{dep}\","));
        }
        lines.push("]".to_string());
        lines.push(String::new());
        lines.push("Then add operational metadata for each:".to_string());
        for dep in &diagnosis.missing_system_deps {
            lines.push(String::new());
            lines.push(format!("[tool.wads.external.ops.{dep}]"));
            lines.push(format!("canonical_id = \"dep:generic/{dep}\""));
            lines.push(format!("rationale = \"Description of why {dep} is needed\""));
            lines.push(format!("install.linux = \"sudo apt-get install -y {dep}\""));
        }
        lines.push(String::new());
        lines.push("### Option 2: Manual CI fix".to_string());
        lines.push(String::new());
        lines.push("Add this step to `.github/workflows/ci.yml`".to_string());
        lines.push("after 'Set up Python' step:".to_string());
        lines.push(String::new());
        lines.push("```yaml".to_string());
        lines.push("      - name: Install System Dependencies".to_string());
        lines.push("        run: |".to_string());
        for dep in &diagnosis.missing_system_deps {
            match dep.as_str() {
                "msodbcsql18" => {
                    lines.push(
                        "          curl https://packages.microsoft.com/keys/microsoft.asc | sudo apt-key add -"
                            .to_string(),
                    );
                    lines.push(
                        "          curl https://packages.microsoft.com/config/ubuntu/$(lsb_release -rs)/prod.list | sudo tee /etc/apt/sources.list.d/mssql-release.list"
                            .to_string(),
                    );
                    lines.push("          sudo apt-get update".to_string());
                    lines.push(
                        "          sudo ACCEPT_EULA=Y apt-get install -y msodbcsql18".to_string(),
                    );
                }
                "unixodbc" => {
                    lines.push("          sudo apt-get update".to_string());
                    lines.push(
                        "          sudo apt-get install -y unixodbc unixodbc-dev".to_string(),
                    );
                }
                other => lines.push(format!("          sudo apt-get install -y {other}")),
            }
        }
        lines.push("```".to_string());
        lines.push(String::new());
    }

    if !diagnosis.missing_python_deps.is_empty() {
        lines.push("## Fix Python Dependencies".to_string());
        lines.push(String::new());
        lines.push("Add to `[project.dependencies]` in `pyproject.toml`:".to_string());
        lines.push(String::new());
        for dep in &diagnosis.missing_python_deps {
            lines.push(format!("    \"{dep}\","));
        }
        lines.push(String::new());
    }

    lines.push(bar);
    lines.join("\n")
}
