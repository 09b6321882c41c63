//! Typed CI-configuration view over `pyproject.toml`.
//!
//! The project file is the single source of truth for CI settings: this module
//! wraps the parsed document in accessors with documented defaults and turns
//! declared dependencies plus operational metadata into the install-step and
//! job fragments the workflow templates consume.
//!
//! PEP 725/804 support:
//! - `[external]` holds DepURLs for non-PyPI dependencies
//! - `[tool.wads.external.ops]` holds project-local operational metadata
//! - the legacy `[tool.wads.ci.testing.system_dependencies]` format is still
//!   honored, with a deprecation diagnostic

use crate::depurl;
use crate::diagnostics::Diagnostics;
use crate::doc;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;

/// Conventional file name resolved inside directory paths.
pub const PYPROJECT_FILE: &str = "pyproject.toml";

const CI_PATH: [&str; 3] = ["tool", "wads", "ci"];
const OPS_PATH: [&str; 4] = ["tool", "wads", "external", "ops"];

/// CI platform an install command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Platform {
    Linux,
    Macos,
    Windows,
}

impl Platform {
    /// Key used in `[tool.wads.external.ops.<name>.install]`.
    pub fn key(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
        }
    }

    /// Key used by the legacy `system_dependencies` mapping, where Linux runs
    /// on Ubuntu images.
    pub fn legacy_key(self) -> &'static str {
        match self {
            Platform::Linux => "ubuntu",
            other => other.key(),
        }
    }
}

/// An install value: either one command or an ordered command sequence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InstallCommand {
    Single(String),
    Sequence(Vec<String>),
}

impl InstallCommand {
    /// Flatten either variant into an ordered list of shell commands.
    pub fn commands(&self) -> Vec<String> {
        match self {
            InstallCommand::Single(command) => vec![command.clone()],
            InstallCommand::Sequence(commands) => commands.clone(),
        }
    }
}

/// Operational metadata for one external dependency.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpsEntry {
    #[serde(default)]
    pub canonical_id: String,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Platform key (`linux`/`macos`/`windows`) to install command(s).
    #[serde(default)]
    pub install: BTreeMap<String, InstallCommand>,
}

/// DepURLs declared in the `[external]` table, split by role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalDependencies {
    pub build: Vec<String>,
    pub host: Vec<String>,
    pub runtime: Vec<String>,
    pub optional_build: BTreeMap<String, Vec<String>>,
    pub optional_host: BTreeMap<String, Vec<String>>,
    pub optional_runtime: BTreeMap<String, Vec<String>>,
    pub groups: BTreeMap<String, Vec<String>>,
}

impl ExternalDependencies {
    pub fn is_empty(&self) -> bool {
        self.build.is_empty()
            && self.host.is_empty()
            && self.runtime.is_empty()
            && self.optional_build.is_empty()
            && self.optional_host.is_empty()
            && self.optional_runtime.is_empty()
            && self.groups.is_empty()
    }

    /// Required DepURLs in resolution order: build, then host, then runtime,
    /// each preserving declaration order. Optional and grouped roles are not
    /// installed at test time.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.build
            .iter()
            .chain(&self.host)
            .chain(&self.runtime)
            .map(String::as_str)
    }
}

/// Legacy `system_dependencies` normalized to the fixed platform mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemPackages {
    pub ubuntu: Vec<String>,
    pub macos: Vec<String>,
    pub windows: Vec<String>,
}

impl SystemPackages {
    pub fn for_platform(&self, platform: Platform) -> &[String] {
        match platform {
            Platform::Linux => &self.ubuntu,
            Platform::Macos => &self.macos,
            Platform::Windows => &self.windows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ubuntu.is_empty() && self.macos.is_empty() && self.windows.is_empty()
    }
}

/// Read-only CI configuration extracted from a parsed `pyproject.toml`.
#[derive(Debug, Clone)]
pub struct CiConfig {
    data: Value,
    project_name: String,
}

impl CiConfig {
    /// Wrap parsed document data. The project name falls back from the
    /// explicit override to `tool.wads.ci.project_name` to `project.name`.
    pub fn new(data: Value, project_name: Option<&str>) -> Self {
        let resolved = project_name
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| {
                let from_ci = doc::str_or(&data, &ci(&["project_name"]), "");
                if from_ci.is_empty() {
                    doc::str_or(&data, &["project", "name"], "")
                } else {
                    from_ci
                }
            });
        Self {
            data,
            project_name: resolved,
        }
    }

    /// Load from a `pyproject.toml` file, or a directory containing one.
    /// Missing or unparseable files are explicit errors.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = resolve_pyproject(path);
        let text =
            fs::read_to_string(&file).with_context(|| format!("read {}", file.display()))?;
        let data: Value = text
            .parse()
            .with_context(|| format!("parse {}", file.display()))?;
        Ok(Self::new(data, None))
    }

    /// Load from a file, substituting a minimal empty-but-valid configuration
    /// when the file does not exist.
    pub fn load_or_default(path: &Path, project_name: &str) -> Result<Self> {
        let file = resolve_pyproject(path);
        if !file.exists() {
            let mut project = toml::map::Map::new();
            project.insert("name".to_string(), Value::String(project_name.to_string()));
            let mut root = toml::map::Map::new();
            root.insert("project".to_string(), Value::Table(project));
            return Ok(Self::new(Value::Table(root), Some(project_name)));
        }
        Self::from_file(&file)
    }

    /// The parsed document this configuration wraps.
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Whether any `[tool.wads.ci]` configuration is present at all.
    pub fn has_ci_config(&self) -> bool {
        doc::table_at(&self.data, &CI_PATH).is_some_and(|table| !table.is_empty())
    }

    // Execution flow and commands

    pub fn commands_pre_test(&self) -> Vec<String> {
        doc::str_seq_or(&self.data, &ci(&["commands", "pre_test"]), &[])
    }

    /// Test commands; defaults to `["pytest"]`.
    pub fn commands_test(&self) -> Vec<String> {
        doc::str_seq_or(&self.data, &ci(&["commands", "test"]), &["pytest"])
    }

    pub fn commands_post_test(&self) -> Vec<String> {
        doc::str_seq_or(&self.data, &ci(&["commands", "post_test"]), &[])
    }

    pub fn commands_lint(&self) -> Vec<String> {
        doc::str_seq_or(&self.data, &ci(&["commands", "lint"]), &[])
    }

    pub fn commands_format(&self) -> Vec<String> {
        doc::str_seq_or(&self.data, &ci(&["commands", "format"]), &[])
    }

    // Environment variables

    pub fn env_required(&self) -> Vec<String> {
        doc::str_seq_or(&self.data, &ci(&["env", "required"]), &[])
    }

    pub fn env_defaults(&self) -> BTreeMap<String, String> {
        doc::str_map_or(&self.data, &ci(&["env", "defaults"]))
    }

    // Code quality gates

    pub fn is_ruff_enabled(&self) -> bool {
        doc::bool_or(&self.data, &ci(&["quality", "ruff", "enabled"]), false)
    }

    pub fn is_black_enabled(&self) -> bool {
        doc::bool_or(&self.data, &ci(&["quality", "black", "enabled"]), false)
    }

    pub fn is_mypy_enabled(&self) -> bool {
        doc::bool_or(&self.data, &ci(&["quality", "mypy", "enabled"]), false)
    }

    // Test configuration

    pub fn python_versions(&self) -> Vec<String> {
        doc::str_seq_or(
            &self.data,
            &ci(&["testing", "python_versions"]),
            &["3.10", "3.12"],
        )
    }

    pub fn pytest_args(&self) -> Vec<String> {
        doc::str_seq_or(
            &self.data,
            &ci(&["testing", "pytest_args"]),
            &["-v", "--tb=short"],
        )
    }

    pub fn coverage_enabled(&self) -> bool {
        doc::bool_or(&self.data, &ci(&["testing", "coverage_enabled"]), true)
    }

    /// Minimum coverage threshold; 0 means unenforced.
    pub fn coverage_threshold(&self) -> i64 {
        doc::int_or(&self.data, &ci(&["testing", "coverage_threshold"]), 0)
    }

    pub fn exclude_paths(&self) -> Vec<String> {
        doc::str_seq_or(
            &self.data,
            &ci(&["testing", "exclude_paths"]),
            &["examples", "scrap"],
        )
    }

    pub fn test_on_windows(&self) -> bool {
        doc::bool_or(&self.data, &ci(&["testing", "test_on_windows"]), true)
    }

    /// Legacy system dependencies, normalized to the fixed platform mapping.
    ///
    /// A flat list means Ubuntu-only; a mapping is read per platform with
    /// absent platforms defaulting to empty. Deprecated in favor of
    /// [`CiConfig::external_dependencies`].
    pub fn system_packages(&self) -> SystemPackages {
        match doc::get(&self.data, &ci(&["testing", "system_dependencies"])) {
            Some(Value::Array(items)) => SystemPackages {
                ubuntu: doc::str_seq(items),
                ..SystemPackages::default()
            },
            Some(Value::Table(table)) => {
                let platform = |key: &str| {
                    table
                        .get(key)
                        .and_then(Value::as_array)
                        .map(|items| doc::str_seq(items))
                        .unwrap_or_default()
                };
                SystemPackages {
                    ubuntu: platform("ubuntu"),
                    macos: platform("macos"),
                    windows: platform("windows"),
                }
            }
            _ => SystemPackages::default(),
        }
    }

    // External dependencies (PEP 725/804)

    /// DepURLs declared in the `[external]` table, all seven roles present
    /// (empty) even when the table is absent.
    pub fn external_dependencies(&self) -> ExternalDependencies {
        ExternalDependencies {
            build: doc::str_seq_or(&self.data, &["external", "build-requires"], &[]),
            host: doc::str_seq_or(&self.data, &["external", "host-requires"], &[]),
            runtime: doc::str_seq_or(&self.data, &["external", "dependencies"], &[]),
            optional_build: self.external_group("optional-build-requires"),
            optional_host: self.external_group("optional-host-requires"),
            optional_runtime: self.external_group("optional-dependencies"),
            groups: self.external_group("dependency-groups"),
        }
    }

    fn external_group(&self, key: &str) -> BTreeMap<String, Vec<String>> {
        let Some(table) = doc::table_at(&self.data, &["external", key]) else {
            return BTreeMap::new();
        };
        table
            .iter()
            .map(|(group, value)| {
                let depurls = value.as_array().map(|items| doc::str_seq(items));
                (group.clone(), depurls.unwrap_or_default())
            })
            .collect()
    }

    pub fn has_external_dependencies(&self) -> bool {
        !self.external_dependencies().is_empty()
    }

    /// Operational metadata from `[tool.wads.external.ops]`, keyed by simple
    /// dependency name. Entries that fail to decode are skipped.
    pub fn external_ops(&self) -> BTreeMap<String, OpsEntry> {
        let Some(table) = doc::table_at(&self.data, &OPS_PATH) else {
            return BTreeMap::new();
        };
        table
            .iter()
            .filter_map(|(name, value)| {
                let entry: OpsEntry = value.clone().try_into().ok()?;
                Some((name.clone(), entry))
            })
            .collect()
    }

    // Build and publish settings

    pub fn build_sdist(&self) -> bool {
        doc::bool_or(&self.data, &ci(&["build", "sdist"]), true)
    }

    pub fn build_wheel(&self) -> bool {
        doc::bool_or(&self.data, &ci(&["build", "wheel"]), true)
    }

    pub fn publish_enabled(&self) -> bool {
        doc::bool_or(&self.data, &ci(&["publish", "enabled"]), true)
    }

    // Documentation settings

    pub fn docs_enabled(&self) -> bool {
        doc::bool_or(&self.data, &ci(&["docs", "enabled"]), true)
    }

    pub fn docs_builder(&self) -> String {
        doc::str_or(&self.data, &ci(&["docs", "builder"]), "epythet")
    }

    pub fn docs_ignore_paths(&self) -> Vec<String> {
        doc::str_seq_or(
            &self.data,
            &ci(&["docs", "ignore_paths"]),
            &["tests/", "scrap/", "examples/"],
        )
    }

    // Workflow fragment generation

    /// YAML `env:` block for the workflow header.
    pub fn generate_env_block(&self) -> String {
        let mut lines = vec![
            "env:".to_string(),
            format!("  PROJECT_NAME: {}", self.project_name),
        ];
        for (key, value) in self.env_defaults() {
            lines.push(format!("  {key}: {value}"));
        }
        lines.join("\n")
    }

    /// YAML steps installing declared dependencies and running custom
    /// pre-test commands, or the empty string when there is nothing to do.
    ///
    /// Resolves both the PEP 725 `[external]` declarations (via their ops
    /// entries) and the deprecated `system_dependencies` list. Pure over the
    /// wrapped document: identical input yields identical output.
    pub fn generate_pre_test_steps(
        &self,
        platform: Platform,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let mut install_commands =
            self.resolve_install_commands(platform, true, diagnostics);

        let legacy = self.system_packages();
        let packages = legacy.for_platform(platform);
        if !packages.is_empty() {
            diagnostics.deprecation(
                "Using deprecated [tool.wads.ci.testing.system_dependencies]. \
                 Please migrate to [external] with DepURLs and [tool.wads.external.ops]",
            );
            // Only the Ubuntu runner has a synthesized legacy installer.
            if platform == Platform::Linux {
                install_commands.push("sudo apt-get update".to_string());
                install_commands
                    .push(format!("sudo apt-get install -y {}", packages.join(" ")));
            }
        }

        let mut steps: Vec<String> = Vec::new();
        if !install_commands.is_empty() {
            steps.push("      - name: Install System Dependencies".to_string());
            steps.push("        run: |".to_string());
            for command in &install_commands {
                steps.push(format!("          {command}"));
            }
        }

        let pre_test = self.commands_pre_test();
        if !pre_test.is_empty() {
            if !steps.is_empty() {
                steps.push(String::new());
            }
            steps.push("      - name: Pre-test Setup".to_string());
            steps.push("        run: |".to_string());
            for command in &pre_test {
                steps.push(format!("          {command}"));
            }
        }

        steps.join("\n")
    }

    /// YAML for the informational Windows validation job, or the empty string
    /// when `test_on_windows` is disabled.
    pub fn generate_windows_validation_job(&self, diagnostics: &mut Diagnostics) -> String {
        if !self.test_on_windows() {
            return String::new();
        }

        let mut install_commands =
            self.resolve_install_commands(Platform::Windows, false, diagnostics);

        let legacy = self.system_packages();
        if !legacy.windows.is_empty() {
            diagnostics.deprecation(
                "Using deprecated [tool.wads.ci.testing.system_dependencies]. \
                 Please migrate to [external] with DepURLs and [tool.wads.external.ops]",
            );
            install_commands.push(format!(
                "choco install -y {}",
                legacy.windows.join(" ")
            ));
        }

        let mut system_deps_step = String::new();
        if !install_commands.is_empty() {
            system_deps_step.push_str("      - name: Install System Dependencies\n");
            system_deps_step.push_str("        run: |\n");
            for command in &install_commands {
                system_deps_step.push_str(&format!("          {command}\n"));
            }
            system_deps_step.push('\n');
        }

        let exclude = self.exclude_paths().join(",");
        let pytest_args = self.pytest_args().join(" ");
        format!(
            r#"
  windows-validation:
    name: Windows Tests (Informational)
    if: "!contains(github.event.head_commit.message, '[skip ci]')"
    runs-on: windows-latest
    continue-on-error: true  # Don't fail the entire workflow if Windows tests fail

    steps:
      - uses: actions/checkout@v4

      - name: Set up Python 3.10
        uses: actions/setup-python@v6
        with:
          python-version: "3.10"
{system_deps_step}
      - name: Install Dependencies
        uses: i2mint/wads/actions/install-deps@master
        with:
          dependency-files: pyproject.toml
          extras: dev,test

      - name: Run Windows Tests
        uses: i2mint/wads/actions/windows-tests@master
        with:
          root-dir: ${{{{ env.PROJECT_NAME }}}}
          exclude: {exclude}
          pytest-args: {pytest_args}
"#
        )
    }

    /// YAML for the GitHub Pages job, or the empty string when docs are
    /// disabled.
    pub fn generate_github_pages_job(&self) -> String {
        if !self.docs_enabled() {
            return String::new();
        }
        let ignore_paths = self.docs_ignore_paths().join(",");
        format!(
            r#"
  github-pages:
    name: Publish GitHub Pages

    permissions:
      contents: write
      pages: write
      id-token: write

    if: "!contains(github.event.head_commit.message, '[skip ci]') && github.ref == format('refs/heads/{{0}}', github.event.repository.default_branch)"
    needs: publish
    runs-on: ubuntu-latest

    steps:
      - uses: i2mint/epythet/actions/publish-github-pages@master
        with:
          github-token: ${{{{ secrets.GITHUB_TOKEN }}}}
          ignore: "{ignore_paths}"
"#
        )
    }

    /// All placeholder substitutions for CI workflow template generation.
    pub fn template_substitutions(
        &self,
        diagnostics: &mut Diagnostics,
    ) -> BTreeMap<&'static str, String> {
        let python_versions = serde_json::to_string(&self.python_versions())
            .expect("serialize python version matrix");
        BTreeMap::from([
            ("#ENV_BLOCK#", self.generate_env_block()),
            ("#PYTHON_VERSIONS#", python_versions),
            (
                "#PRE_TEST_STEPS#",
                self.generate_pre_test_steps(Platform::Linux, diagnostics),
            ),
            ("#EXCLUDE_PATHS#", self.exclude_paths().join(",")),
            ("#COVERAGE_ENABLED#", self.coverage_enabled().to_string()),
            ("#PYTEST_ARGS#", self.pytest_args().join(" ")),
            (
                "#WINDOWS_VALIDATION_JOB#",
                self.generate_windows_validation_job(diagnostics),
            ),
            ("#GITHUB_PAGES_JOB#", self.generate_github_pages_job()),
            ("#BUILD_SDIST#", self.build_sdist().to_string()),
            ("#BUILD_WHEEL#", self.build_wheel().to_string()),
            ("#PROJECT_NAME#", self.project_name.clone()),
        ])
    }

    /// Resolve required DepURLs against the ops table into platform install
    /// commands. `warn_on_invalid` controls whether malformed DepURLs and
    /// missing ops entries are reported; a valid entry with no command for
    /// this platform contributes nothing silently, since some dependencies
    /// are platform-specific by design.
    fn resolve_install_commands(
        &self,
        platform: Platform,
        warn_on_invalid: bool,
        diagnostics: &mut Diagnostics,
    ) -> Vec<String> {
        let external = self.external_dependencies();
        let ops = self.external_ops();
        let mut commands = Vec::new();

        for url in external.required() {
            if !depurl::is_valid(url) {
                if warn_on_invalid {
                    diagnostics.warn(format!("Invalid DepURL format: {url}"));
                }
                continue;
            }
            let simple_name = depurl::to_simple_name(url);
            match ops.get(&simple_name) {
                Some(entry) => {
                    if let Some(install) = entry.install.get(platform.key()) {
                        commands.extend(install.commands());
                    }
                }
                None => {
                    if warn_on_invalid {
                        // An entry the decode step dropped gets named as
                        // malformed rather than reported as absent.
                        let declared = doc::table_at(&self.data, &OPS_PATH)
                            .is_some_and(|table| table.contains_key(&simple_name));
                        if declared {
                            diagnostics.warn(format!(
                                "Malformed [tool.wads.external.ops.{simple_name}] entry \
                                 for {url}; ignoring it"
                            ));
                        } else {
                            diagnostics.warn(format!(
                                "No operational metadata found for {url} \
                                 (looked for [tool.wads.external.ops.{simple_name}])"
                            ));
                        }
                    }
                }
            }
        }

        commands
    }
}

/// Directory paths resolve to the conventional `pyproject.toml` inside them.
pub fn resolve_pyproject(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(PYPROJECT_FILE)
    } else {
        path.to_path_buf()
    }
}

fn ci<'a>(rest: &[&'a str]) -> Vec<&'a str> {
    let mut path = CI_PATH.to_vec();
    path.extend_from_slice(rest);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml_text: &str) -> CiConfig {
        let data: Value = toml_text.parse().expect("parse test TOML");
        CiConfig::new(data, None)
    }

    fn empty_config() -> CiConfig {
        config(r#"[project]
name = "test-project"
"#)
    }

    #[test]
    fn empty_configuration_uses_documented_defaults() {
        let cfg = empty_config();
        assert_eq!(cfg.project_name(), "test-project");
        assert!(!cfg.has_ci_config());
        assert_eq!(cfg.commands_test(), vec!["pytest"]);
        assert!(cfg.commands_pre_test().is_empty());
        assert!(cfg.commands_lint().is_empty());
        assert!(cfg.env_required().is_empty());
        assert!(cfg.env_defaults().is_empty());
        assert!(!cfg.is_ruff_enabled());
        assert!(!cfg.is_black_enabled());
        assert!(!cfg.is_mypy_enabled());
        assert_eq!(cfg.python_versions(), vec!["3.10", "3.12"]);
        assert_eq!(cfg.pytest_args(), vec!["-v", "--tb=short"]);
        assert!(cfg.coverage_enabled());
        assert_eq!(cfg.coverage_threshold(), 0);
        assert_eq!(cfg.exclude_paths(), vec!["examples", "scrap"]);
        assert!(cfg.test_on_windows());
        assert!(cfg.build_sdist());
        assert!(cfg.build_wheel());
        assert!(cfg.publish_enabled());
        assert!(cfg.docs_enabled());
        assert_eq!(cfg.docs_builder(), "epythet");
        assert_eq!(cfg.docs_ignore_paths(), vec!["tests/", "scrap/", "examples/"]);
    }

    #[test]
    fn empty_external_section_has_all_roles_empty() {
        let cfg = empty_config();
        let deps = cfg.external_dependencies();
        assert!(deps.build.is_empty());
        assert!(deps.host.is_empty());
        assert!(deps.runtime.is_empty());
        assert!(deps.optional_build.is_empty());
        assert!(deps.optional_host.is_empty());
        assert!(deps.optional_runtime.is_empty());
        assert!(deps.groups.is_empty());
        assert!(!cfg.has_external_dependencies());
        assert!(cfg.external_ops().is_empty());
    }

    #[test]
    fn empty_configuration_generates_no_steps() {
        let cfg = empty_config();
        let mut diagnostics = Diagnostics::new();
        assert_eq!(cfg.generate_pre_test_steps(Platform::Linux, &mut diagnostics), "");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn parses_external_roles() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [external]
            build-requires = ["dep:virtual/compiler/c"]
            host-requires = ["dep:generic/unixodbc"]
            dependencies = ["dep:generic/git"]

            [external.optional-dependencies]
            git-support = ["dep:generic/git"]

            [external.dependency-groups]
            dev = ["dep:generic/git", "dep:generic/make"]
            "#,
        );
        let deps = cfg.external_dependencies();
        assert_eq!(deps.build, vec!["dep:virtual/compiler/c"]);
        assert_eq!(deps.host, vec!["dep:generic/unixodbc"]);
        assert_eq!(deps.runtime, vec!["dep:generic/git"]);
        assert_eq!(
            deps.optional_runtime.get("git-support"),
            Some(&vec!["dep:generic/git".to_string()])
        );
        assert_eq!(
            deps.groups.get("dev"),
            Some(&vec!["dep:generic/git".to_string(), "dep:generic/make".to_string()])
        );
        assert!(cfg.has_external_dependencies());
        let required: Vec<&str> = deps.required().collect();
        assert_eq!(
            required,
            vec!["dep:virtual/compiler/c", "dep:generic/unixodbc", "dep:generic/git"]
        );
    }

    #[test]
    fn parses_ops_metadata_with_both_command_shapes() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [tool.wads.external.ops.unixodbc]
            canonical_id = "dep:generic/unixodbc"
            rationale = "ODBC driver interface"
            url = "https://www.unixodbc.org/"
            install.linux = [
                "sudo apt-get update",
                "sudo apt-get install -y unixodbc unixodbc-dev",
            ]
            install.macos = "brew install unixodbc"
            "#,
        );
        let ops = cfg.external_ops();
        let entry = ops.get("unixodbc").expect("ops entry");
        assert_eq!(entry.canonical_id, "dep:generic/unixodbc");
        assert_eq!(entry.rationale.as_deref(), Some("ODBC driver interface"));
        assert_eq!(
            entry.install.get("linux").map(InstallCommand::commands),
            Some(vec![
                "sudo apt-get update".to_string(),
                "sudo apt-get install -y unixodbc unixodbc-dev".to_string(),
            ])
        );
        assert_eq!(
            entry.install.get("macos").map(InstallCommand::commands),
            Some(vec!["brew install unixodbc".to_string()])
        );
    }

    #[test]
    fn pre_test_steps_resolve_ops_install_commands() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [external]
            dependencies = ["dep:generic/git"]

            [tool.wads.external.ops.git]
            canonical_id = "dep:generic/git"
            install.linux = "sudo apt-get install -y git"
            "#,
        );
        let mut diagnostics = Diagnostics::new();
        let steps = cfg.generate_pre_test_steps(Platform::Linux, &mut diagnostics);
        assert!(steps.contains("Install System Dependencies"));
        assert!(steps.contains("sudo apt-get install -y git"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn pre_test_steps_expand_command_sequences_in_order() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [external]
            dependencies = ["dep:generic/unixodbc"]

            [tool.wads.external.ops.unixodbc]
            canonical_id = "dep:generic/unixodbc"
            install.linux = [
                "sudo apt-get update",
                "sudo apt-get install -y unixodbc unixodbc-dev",
            ]
            "#,
        );
        let mut diagnostics = Diagnostics::new();
        let steps = cfg.generate_pre_test_steps(Platform::Linux, &mut diagnostics);
        let update = steps.find("sudo apt-get update").expect("update command");
        let install = steps
            .find("sudo apt-get install -y unixodbc unixodbc-dev")
            .expect("install command");
        assert!(update < install);
    }

    #[test]
    fn pre_test_steps_warn_on_invalid_depurl_and_missing_ops() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [external]
            dependencies = ["not-a-depurl", "dep:generic/ffmpeg"]
            "#,
        );
        let mut diagnostics = Diagnostics::new();
        let steps = cfg.generate_pre_test_steps(Platform::Linux, &mut diagnostics);
        assert_eq!(steps, "");
        assert_eq!(diagnostics.len(), 2);
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert!(messages[0].contains("Invalid DepURL format: not-a-depurl"));
        assert!(messages[1].contains("[tool.wads.external.ops.ffmpeg]"));
    }

    #[test]
    fn undecodable_ops_entry_is_reported_as_malformed() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [external]
            dependencies = ["dep:generic/ffmpeg"]

            [tool.wads.external.ops.ffmpeg]
            canonical_id = "dep:generic/ffmpeg"
            install = 42
            "#,
        );
        assert!(cfg.external_ops().is_empty());

        let mut diagnostics = Diagnostics::new();
        let steps = cfg.generate_pre_test_steps(Platform::Linux, &mut diagnostics);
        assert_eq!(steps, "");
        assert_eq!(diagnostics.len(), 1);
        let message = &diagnostics.iter().next().expect("one diagnostic").message;
        assert!(message.contains("Malformed [tool.wads.external.ops.ffmpeg]"));
        assert!(!message.contains("No operational metadata"));
    }

    #[test]
    fn missing_platform_install_entry_is_not_an_error() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [external]
            dependencies = ["dep:generic/git"]

            [tool.wads.external.ops.git]
            canonical_id = "dep:generic/git"
            install.linux = "sudo apt-get install -y git"
            "#,
        );
        let mut diagnostics = Diagnostics::new();
        let steps = cfg.generate_pre_test_steps(Platform::Macos, &mut diagnostics);
        assert_eq!(steps, "");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn legacy_list_synthesizes_batched_apt_install() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [tool.wads.ci.testing]
            system_dependencies = ["ffmpeg", "libsndfile1"]
            "#,
        );
        let mut diagnostics = Diagnostics::new();
        let steps = cfg.generate_pre_test_steps(Platform::Linux, &mut diagnostics);
        assert!(steps.contains("sudo apt-get update"));
        assert!(steps.contains("sudo apt-get install -y ffmpeg libsndfile1"));
        assert_eq!(diagnostics.count_of(crate::diagnostics::Severity::Deprecation), 1);

        // Declared but untranslated on macOS: deprecation only, no commands.
        let mut diagnostics = Diagnostics::new();
        let macos_steps = cfg.generate_pre_test_steps(Platform::Macos, &mut diagnostics);
        assert_eq!(macos_steps, "");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn legacy_platform_mapping_selects_requested_platform() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [tool.wads.ci.testing.system_dependencies]
            ubuntu = ["ffmpeg", "libsndfile1"]
            macos = ["ffmpeg", "libsndfile"]
            windows = []
            "#,
        );
        let packages = cfg.system_packages();
        assert_eq!(packages.ubuntu, vec!["ffmpeg", "libsndfile1"]);
        assert_eq!(packages.macos, vec!["ffmpeg", "libsndfile"]);
        assert!(packages.windows.is_empty());

        let mut diagnostics = Diagnostics::new();
        let steps = cfg.generate_pre_test_steps(Platform::Linux, &mut diagnostics);
        assert!(steps.contains("sudo apt-get install -y ffmpeg libsndfile1"));
    }

    #[test]
    fn modern_and_legacy_dependencies_coexist() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [external]
            dependencies = ["dep:generic/git"]

            [tool.wads.external.ops.git]
            canonical_id = "dep:generic/git"
            install.linux = "sudo apt-get install -y git"

            [tool.wads.ci.testing]
            system_dependencies = ["ffmpeg"]
            "#,
        );
        let mut diagnostics = Diagnostics::new();
        let steps = cfg.generate_pre_test_steps(Platform::Linux, &mut diagnostics);
        assert!(steps.contains("sudo apt-get install -y git"));
        assert!(steps.contains("sudo apt-get install -y ffmpeg"));
    }

    #[test]
    fn custom_pre_test_commands_follow_install_commands() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [tool.wads.ci.commands]
            pre_test = ["python setup_test_data.py"]
            "#,
        );
        let mut diagnostics = Diagnostics::new();
        let steps = cfg.generate_pre_test_steps(Platform::Linux, &mut diagnostics);
        assert!(steps.contains("Pre-test Setup"));
        assert!(steps.contains("python setup_test_data.py"));
    }

    #[test]
    fn windows_job_includes_windows_install_commands() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [external]
            dependencies = ["dep:generic/git"]

            [tool.wads.external.ops.git]
            canonical_id = "dep:generic/git"
            install.windows = "choco install -y git"

            [tool.wads.ci.testing]
            test_on_windows = true
            "#,
        );
        let mut diagnostics = Diagnostics::new();
        let job = cfg.generate_windows_validation_job(&mut diagnostics);
        assert!(job.contains("windows-validation:"));
        assert!(job.contains("choco install -y git"));
    }

    #[test]
    fn windows_job_disabled_returns_empty_string() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [external]
            dependencies = ["dep:generic/git"]

            [tool.wads.external.ops.git]
            canonical_id = "dep:generic/git"
            install.windows = "choco install -y git"

            [tool.wads.ci.testing]
            test_on_windows = false
            "#,
        );
        let mut diagnostics = Diagnostics::new();
        assert_eq!(cfg.generate_windows_validation_job(&mut diagnostics), "");
    }

    #[test]
    fn pre_test_generation_is_idempotent() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [external]
            host-requires = ["dep:generic/unixodbc"]
            dependencies = ["dep:generic/git"]

            [tool.wads.external.ops.unixodbc]
            canonical_id = "dep:generic/unixodbc"
            install.linux = "sudo apt-get install -y unixodbc"

            [tool.wads.external.ops.git]
            canonical_id = "dep:generic/git"
            install.linux = "sudo apt-get install -y git"
            "#,
        );
        let mut first_diags = Diagnostics::new();
        let first = cfg.generate_pre_test_steps(Platform::Linux, &mut first_diags);
        let mut second_diags = Diagnostics::new();
        let second = cfg.generate_pre_test_steps(Platform::Linux, &mut second_diags);
        assert_eq!(first, second);
        assert!(first.contains("sudo apt-get install -y unixodbc"));
        assert!(first.contains("sudo apt-get install -y git"));
    }

    #[test]
    fn env_block_lists_project_name_and_defaults() {
        let cfg = config(
            r#"
            [project]
            name = "test-project"

            [tool.wads.ci.env.defaults]
            LOG_LEVEL = "debug"
            "#,
        );
        let block = cfg.generate_env_block();
        assert_eq!(
            block,
            "env:\n  PROJECT_NAME: test-project\n  LOG_LEVEL: debug"
        );
    }

    #[test]
    fn substitutions_cover_every_placeholder() {
        let cfg = empty_config();
        let mut diagnostics = Diagnostics::new();
        let substitutions = cfg.template_substitutions(&mut diagnostics);
        for key in [
            "#ENV_BLOCK#",
            "#PYTHON_VERSIONS#",
            "#PRE_TEST_STEPS#",
            "#EXCLUDE_PATHS#",
            "#COVERAGE_ENABLED#",
            "#PYTEST_ARGS#",
            "#WINDOWS_VALIDATION_JOB#",
            "#GITHUB_PAGES_JOB#",
            "#BUILD_SDIST#",
            "#BUILD_WHEEL#",
            "#PROJECT_NAME#",
        ] {
            assert!(substitutions.contains_key(key), "missing {key}");
        }
        assert_eq!(substitutions["#PYTHON_VERSIONS#"], r#"["3.10","3.12"]"#);
        assert_eq!(substitutions["#COVERAGE_ENABLED#"], "true");
        assert_eq!(substitutions["#PROJECT_NAME#"], "test-project");
    }

    #[test]
    fn project_name_override_order() {
        let data: Value = r#"
            [project]
            name = "from-project"

            [tool.wads.ci]
            project_name = "from-ci"
        "#
        .parse()
        .expect("parse test TOML");
        assert_eq!(CiConfig::new(data.clone(), None).project_name(), "from-ci");
        assert_eq!(
            CiConfig::new(data, Some("explicit")).project_name(),
            "explicit"
        );
    }
}
