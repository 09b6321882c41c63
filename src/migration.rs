//! Migration from legacy system-dependency declarations to PEP 725.
//!
//! Two legacy dialects exist: `[tool.wads.ci.testing.system_dependencies]`
//! (package names, flat or per platform) and `[tool.wads.ci.env.install]`
//! (raw install commands with no package identifiers). The first can be
//! rewritten mechanically; the second loses the package identity and is
//! flagged for manual migration rather than guessed at.

use crate::config::{self, CiConfig};
use crate::depurl;
use crate::doc;
use crate::tables;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use toml::value::Table;
use toml::Value;

const LEGACY_DEPS_PATH: [&str; 5] = ["tool", "wads", "ci", "testing", "system_dependencies"];
const LEGACY_INSTALL_PATH: [&str; 5] = ["tool", "wads", "ci", "env", "install"];

/// Snapshot of which dependency dialects a document uses and whether an
/// automated rewrite is safe. Produced fresh per analysis, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationAnalysis {
    pub has_legacy_system_deps: bool,
    pub has_legacy_env_install: bool,
    pub has_external_section: bool,
    pub has_external_ops: bool,
    pub legacy_packages: Vec<String>,
    pub legacy_platform_specific: BTreeMap<String, Vec<String>>,
    pub current_depurls: Vec<String>,
    pub recommendations: Vec<String>,
    pub can_auto_migrate: bool,
    pub source_path: Option<PathBuf>,
}

impl MigrationAnalysis {
    fn absent(recommendation: &str) -> Self {
        Self {
            has_legacy_system_deps: false,
            has_legacy_env_install: false,
            has_external_section: false,
            has_external_ops: false,
            legacy_packages: Vec::new(),
            legacy_platform_specific: BTreeMap::new(),
            current_depurls: Vec::new(),
            recommendations: vec![recommendation.to_string()],
            can_auto_migrate: false,
            source_path: None,
        }
    }
}

/// Result of an [`apply_migration`] call.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// The document was rewritten (and optionally backed up) on disk.
    Applied {
        migrated: usize,
        backup: Option<PathBuf>,
    },
    /// Dry run: nothing written, this is what would have been added.
    DryRun { preview: String },
    /// Automatic migration refused; the caller decides how to proceed.
    NotMigratable { reasons: Vec<String> },
}

/// Normalize a distro package name for table lookups: lowercase, then strip a
/// `-dev` suffix, trailing digits, and a leading `lib` prefix.
///
/// `libsndfile1` -> `sndfile`, `unixodbc-dev` -> `unixodbc`.
pub fn normalize_package_name(package: &str) -> String {
    let mut name = package.trim().to_lowercase();
    if let Some(stripped) = name.strip_suffix("-dev") {
        name.truncate(stripped.len());
    }
    while name.ends_with(|c: char| c.is_ascii_digit()) {
        name.pop();
    }
    if let Some(stripped) = name.strip_prefix("lib") {
        name = stripped.to_string();
    }
    name
}

/// Guess a DepURL for a package name. Total and deterministic: the raw
/// lowercased name is checked against the static table first, then the
/// normalized name, and unknown packages fall back to `dep:generic/<name>`.
pub fn guess_depurl(package: &str) -> String {
    let lower = package.trim().to_lowercase();
    if let Some(mapped) = tables::depurl_for(&lower) {
        return mapped.to_string();
    }
    let normalized = normalize_package_name(package);
    if let Some(mapped) = tables::depurl_for(&normalized) {
        return mapped.to_string();
    }
    format!("dep:generic/{normalized}")
}

/// Analyze what a project would need to migrate to PEP 725.
///
/// A missing `pyproject.toml` is a normal all-false outcome, not an error;
/// an unreadable or unparseable file is.
pub fn analyze(path: &Path) -> Result<MigrationAnalysis> {
    let file = config::resolve_pyproject(path);
    if !file.exists() {
        return Ok(MigrationAnalysis::absent("No pyproject.toml found"));
    }

    let text = fs::read_to_string(&file).with_context(|| format!("read {}", file.display()))?;
    let data: Value = text
        .parse()
        .with_context(|| format!("parse {}", file.display()))?;
    let cfg = CiConfig::new(data, None);

    let legacy_value = doc::get(cfg.data(), &LEGACY_DEPS_PATH);
    let has_legacy_system_deps = match legacy_value {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Table(table)) => !table.is_empty(),
        _ => false,
    };

    let has_legacy_env_install = doc::table_at(cfg.data(), &LEGACY_INSTALL_PATH)
        .is_some_and(|table| !table.is_empty());

    // The modern dialect counts as present only when a required-dependency
    // list is non-empty; an empty [external] table or one holding only
    // optional groups does not block auto-migration.
    let external = cfg.external_dependencies();
    let has_external_section =
        !external.build.is_empty() || !external.host.is_empty() || !external.runtime.is_empty();
    let has_external_ops = !cfg.external_ops().is_empty();

    let (legacy_packages, legacy_platform_specific) = collect_legacy_packages(legacy_value);
    let current_depurls: Vec<String> = external.required().map(str::to_string).collect();

    let mut recommendations = Vec::new();
    if has_legacy_system_deps && !has_external_section {
        recommendations.push(
            "Migrate [tool.wads.ci.testing.system_dependencies] to [external] with DepURLs"
                .to_string(),
        );
    }
    if has_external_section && !has_external_ops && !current_depurls.is_empty() {
        recommendations
            .push("Add [tool.wads.external.ops] sections for operational metadata".to_string());
    }
    if has_legacy_env_install {
        recommendations.push(
            "Migrate [tool.wads.ci.env.install] commands to [tool.wads.external.ops]".to_string(),
        );
    }
    if recommendations.is_empty() {
        if has_external_section && has_external_ops {
            recommendations.push("Already using PEP 725 format".to_string());
        } else {
            recommendations.push("No external dependencies declared".to_string());
        }
    }

    // guess_depurl is total, so feasibility reduces to "legacy present and
    // no modern declarations to clobber".
    let can_auto_migrate = has_legacy_system_deps && !has_external_section;

    Ok(MigrationAnalysis {
        has_legacy_system_deps,
        has_legacy_env_install,
        has_external_section,
        has_external_ops,
        legacy_packages,
        legacy_platform_specific,
        current_depurls,
        recommendations,
        can_auto_migrate,
        source_path: Some(file),
    })
}

fn collect_legacy_packages(
    value: Option<&Value>,
) -> (Vec<String>, BTreeMap<String, Vec<String>>) {
    match value {
        Some(Value::Array(items)) => {
            let packages = doc::str_seq(items);
            let mut by_platform = BTreeMap::new();
            by_platform.insert("ubuntu".to_string(), packages.clone());
            (packages, by_platform)
        }
        Some(Value::Table(table)) => {
            let mut by_platform = BTreeMap::new();
            let mut packages = Vec::new();
            let mut seen = BTreeSet::new();
            for (platform, entry) in table {
                let platform_packages = entry
                    .as_array()
                    .map(|items| doc::str_seq(items))
                    .unwrap_or_default();
                for package in &platform_packages {
                    if seen.insert(package.clone()) {
                        packages.push(package.clone());
                    }
                }
                by_platform.insert(platform.clone(), platform_packages);
            }
            (packages, by_platform)
        }
        _ => (Vec::new(), BTreeMap::new()),
    }
}

/// Deduplicated DepURL guesses for the legacy packages, declaration order
/// preserved.
fn guessed_depurls(analysis: &MigrationAnalysis) -> Vec<String> {
    let mut depurls = Vec::new();
    let mut seen = BTreeSet::new();
    for package in &analysis.legacy_packages {
        let guessed = guess_depurl(package);
        if seen.insert(guessed.clone()) {
            depurls.push(guessed);
        }
    }
    depurls
}

/// TOML fragment an automatic migration would add: the `[external]`
/// dependency list plus an ops section per resolved simple name.
pub fn migration_preview(analysis: &MigrationAnalysis) -> String {
    if analysis.legacy_packages.is_empty() {
        return "# No legacy dependencies to migrate".to_string();
    }

    let mut lines = vec![
        "# External dependencies (PEP 725)".to_string(),
        "# Migrated from [tool.wads.ci.testing.system_dependencies]".to_string(),
        String::new(),
    ];

    let depurls = guessed_depurls(analysis);

    lines.push("[external]".to_string());
    lines.push("dependencies = [".to_string());
    for url in &depurls {
        lines.push(format!("    \"{url}\","));
    }
    lines.push("]".to_string());
    lines.push(String::new());

    for url in &depurls {
        let simple_name = depurl::to_simple_name(url);
        lines.push(format!("[tool.wads.external.ops.{simple_name}]"));
        lines.push(format!("canonical_id = \"{url}\""));
        if let Some((rationale, homepage)) = tables::metadata_for(&simple_name) {
            lines.push(format!("rationale = \"{rationale}\""));
            lines.push(format!("url = \"{homepage}\""));
        }
        match tables::install_recipes_for(&simple_name) {
            Some(recipes) => {
                for recipe in recipes {
                    match recipe.commands {
                        [command] => lines
                            .push(format!("install.{} = \"{command}\"", recipe.platform)),
                        commands => {
                            lines.push(format!("install.{} = [", recipe.platform));
                            for command in commands {
                                lines.push(format!("    \"{command}\","));
                            }
                            lines.push("]".to_string());
                        }
                    }
                }
            }
            None => {
                lines.push(format!(
                    "install.linux = \"sudo apt-get install -y {simple_name}\""
                ));
                lines.push(format!("install.macos = \"brew install {simple_name}\""));
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Human-readable migration plan for the analyzed project.
pub fn migration_instructions(analysis: &MigrationAnalysis) -> String {
    let bar = "=".repeat(70);
    let mut lines = vec![
        bar.clone(),
        "MIGRATION TO PEP 725 EXTERNAL DEPENDENCIES".to_string(),
        bar.clone(),
        String::new(),
    ];

    if analysis.has_external_section && analysis.has_external_ops {
        lines.push("Your project already uses PEP 725 format.".to_string());
        lines.push(String::new());
        lines.push(format!("Current DepURLs: {}", analysis.current_depurls.len()));
        return lines.join("\n");
    }

    if analysis.has_legacy_system_deps {
        lines.push("FOUND LEGACY FORMAT:".to_string());
        lines.push("  [tool.wads.ci.testing.system_dependencies]".to_string());
        lines.push(format!("  Packages: {}", analysis.legacy_packages.join(", ")));
        lines.push(String::new());
    }

    if analysis.has_legacy_env_install {
        lines.push("FOUND LEGACY INSTALL COMMANDS:".to_string());
        lines.push("  [tool.wads.ci.env.install]".to_string());
        lines.push(String::new());
        lines.extend(legacy_install_listing(analysis));
        lines.push("  This format contains install commands but doesn't specify".to_string());
        lines.push("  which packages they install. You'll need to:".to_string());
        lines.push(String::new());
        lines.push("  A. Identify the packages (look at apt-get/brew/choco commands)".to_string());
        lines.push("  B. Create DepURLs for each package".to_string());
        lines.push("  C. Move install commands to [tool.wads.external.ops]".to_string());
        lines.push(String::new());
    }

    lines.push("MIGRATION STEPS:".to_string());
    lines.push(String::new());
    for (index, recommendation) in analysis.recommendations.iter().enumerate() {
        lines.push(format!("{}. {recommendation}", index + 1));
    }
    lines.push(String::new());

    if analysis.can_auto_migrate {
        lines.push("This project can be AUTO-MIGRATED".to_string());
        lines.push(String::new());
        lines.push("Run: wads apply /path/to/project".to_string());
        lines.push(String::new());
    } else {
        lines.push("MANUAL MIGRATION REQUIRED".to_string());
        lines.push(String::new());
        if analysis.has_legacy_env_install {
            lines.push("For the [tool.wads.ci.env.install] format:".to_string());
            lines.push(String::new());
            lines.push("Step 1: Examine your current install commands and identify".to_string());
            lines.push("  which packages are being installed".to_string());
            lines.push(String::new());
            lines.push("Step 2: For each package, create entries like this:".to_string());
            lines.push(String::new());
            lines.push("  [external]".to_string());
            lines.push("  dependencies = [\"dep:generic/<package>\"]".to_string());
            lines.push(String::new());
            lines.push("  [tool.wads.external.ops.<package>]".to_string());
            lines.push("  canonical_id = \"dep:generic/<package>\"".to_string());
            lines.push("  rationale = \"Why you need this package\"".to_string());
            lines.push("  install.linux = \"sudo apt-get install -y <package>\"".to_string());
            lines.push(String::new());
            lines.push("Step 3: Remove the old [tool.wads.ci.env.install] section".to_string());
            lines.push(String::new());
        } else {
            lines.push("General steps:".to_string());
            lines.push("1. Add the generated [external] section to your pyproject.toml".to_string());
            lines.push(
                "2. Add [tool.wads.external.ops.<name>] sections for each dependency".to_string(),
            );
            lines.push("3. Remove old sections once verified".to_string());
            lines.push(String::new());
        }
    }

    if !analysis.legacy_packages.is_empty() {
        lines.push("PREVIEW OF MIGRATION:".to_string());
        lines.push(String::new());
        lines.push("Will convert:".to_string());
        for package in analysis.legacy_packages.iter().take(5) {
            lines.push(format!("  \"{package}\" -> \"{}\"", guess_depurl(package)));
        }
        if analysis.legacy_packages.len() > 5 {
            lines.push(format!(
                "  ... and {} more",
                analysis.legacy_packages.len() - 5
            ));
        }
        lines.push(String::new());
    }

    lines.push(bar);
    lines.join("\n")
}

/// Static cheat sheet for the migration workflow, printed by `quickref`.
pub fn quick_reference() -> &'static str {
    r#"QUICK REFERENCE: MIGRATING TO PEP 725
=====================================

CHECK IF MIGRATION IS NEEDED
----------------------------

    wads analyze /path/to/project

Reports which dialects the project uses (legacy system_dependencies,
legacy env.install, PEP 725 [external]) and whether it can be
auto-migrated. Add --json for the raw analysis.

PREVIEW THE CHANGES
-------------------

    wads preview /path/to/project

Prints the TOML an automatic migration would add: the [external]
dependency list plus one [tool.wads.external.ops.<name>] section per
package, with install commands filled in for well-known packages.

APPLY
-----

    wads apply /path/to/project              # writes pyproject.toml.bak first
    wads apply /path/to/project --dry-run    # show changes, write nothing
    wads apply /path/to/project --no-backup

Existing ops entries are never overwritten, and the legacy
system_dependencies section is left in place; remove it once CI is green.

MANUAL MIGRATION
----------------

Projects using [tool.wads.ci.env.install] declare raw install commands
without package identities, so they cannot be rewritten mechanically.
Run `wads instructions /path/to/project` for the step-by-step plan.

DEPURL CHEAT SHEET
------------------

    dep:generic/<name>           concrete package, e.g. dep:generic/ffmpeg
    dep:virtual/compiler/c       virtual capability (gcc, clang)
    dep:generic/<name>@<ver>     version constraint, stripped for ops lookup

The ops table key is the DepURL's simple name: dep:generic/unixodbc maps
to [tool.wads.external.ops.unixodbc], dep:virtual/compiler/c to
[tool.wads.external.ops.compiler-c].
"#
}

/// Commands found under the legacy `env.install` table, for display.
fn legacy_install_listing(analysis: &MigrationAnalysis) -> Vec<String> {
    let Some(source) = analysis.source_path.as_deref() else {
        return Vec::new();
    };
    let Ok(text) = fs::read_to_string(source) else {
        return Vec::new();
    };
    let Ok(data) = text.parse::<Value>() else {
        return Vec::new();
    };
    let Some(install) = doc::table_at(&data, &LEGACY_INSTALL_PATH) else {
        return Vec::new();
    };

    let mut lines = vec!["  Current install commands:".to_string()];
    for (platform, commands) in install {
        lines.push(format!("    [{platform}]"));
        match commands {
            Value::Array(items) => {
                for command in doc::str_seq(items) {
                    lines.push(format!("      {command}"));
                }
            }
            other => {
                if let Some(command) = other.as_str() {
                    lines.push(format!("      {command}"));
                }
            }
        }
    }
    lines.push(String::new());
    lines
}

/// Rewrite `pyproject.toml` to the PEP 725 format.
///
/// Refuses with structured reasons when the project is not mechanically
/// migratable. On success the runtime dependency list is written and an ops
/// entry is synthesized for every simple name not already present; existing
/// ops entries are never overwritten, and the legacy declaration is left in
/// place for the caller to remove once verified. The new document is fully
/// constructed and serialized in memory before the backup/write sequence, so
/// no partial state is observable on failure.
pub fn apply_migration(
    path: &Path,
    create_backup: bool,
    dry_run: bool,
) -> Result<ApplyOutcome> {
    let file = config::resolve_pyproject(path);
    if !file.exists() {
        bail!("{} not found", file.display());
    }

    let analysis = analyze(&file)?;
    if !analysis.can_auto_migrate {
        let mut reasons = Vec::new();
        if !analysis.has_legacy_system_deps && !analysis.has_legacy_env_install {
            reasons.push("no legacy format found to migrate from".to_string());
        }
        if analysis.has_external_section {
            reasons.push(
                "project already declares required [external] dependencies \
                 (manual merge needed)"
                    .to_string(),
            );
        }
        if analysis.has_legacy_env_install && analysis.legacy_packages.is_empty() {
            reasons.push(
                "found [tool.wads.ci.env.install], which requires manual migration \
                 (install commands need to be mapped to specific packages)"
                    .to_string(),
            );
        }
        if analysis.legacy_packages.is_empty() {
            reasons.push("no system dependencies declared to migrate".to_string());
        }
        return Ok(ApplyOutcome::NotMigratable { reasons });
    }

    if dry_run {
        return Ok(ApplyOutcome::DryRun {
            preview: migration_preview(&analysis),
        });
    }

    let text = fs::read_to_string(&file).with_context(|| format!("read {}", file.display()))?;
    let mut data: Value = text
        .parse()
        .with_context(|| format!("parse {}", file.display()))?;
    let root = data
        .as_table_mut()
        .context("pyproject.toml root is not a table")?;

    let depurls = guessed_depurls(&analysis);

    let external = ensure_table_path(root, &["external"])?;
    external.insert(
        "dependencies".to_string(),
        Value::Array(depurls.iter().cloned().map(Value::String).collect()),
    );

    let ops = ensure_table_path(root, &["tool", "wads", "external", "ops"])?;
    for url in &depurls {
        let simple_name = depurl::to_simple_name(url);
        if ops.contains_key(&simple_name) {
            continue;
        }
        ops.insert(simple_name.clone(), Value::Table(ops_entry(url, &simple_name)));
    }

    let serialized = toml::to_string(&data).context("serialize migrated pyproject.toml")?;

    let backup = if create_backup {
        let backup_path = file.with_extension("toml.bak");
        fs::copy(&file, &backup_path)
            .with_context(|| format!("back up {} to {}", file.display(), backup_path.display()))?;
        Some(backup_path)
    } else {
        None
    };

    fs::write(&file, serialized).with_context(|| format!("write {}", file.display()))?;

    Ok(ApplyOutcome::Applied {
        migrated: depurls.len(),
        backup,
    })
}

/// Synthesized ops table for one guessed DepURL: canonical id always,
/// rationale/URL and install commands from the static tables when known,
/// otherwise a minimal generic linux/macos fallback.
fn ops_entry(url: &str, simple_name: &str) -> Table {
    let mut entry = Table::new();
    entry.insert("canonical_id".to_string(), Value::String(url.to_string()));

    if let Some((rationale, homepage)) = tables::metadata_for(simple_name) {
        entry.insert("rationale".to_string(), Value::String(rationale.to_string()));
        entry.insert("url".to_string(), Value::String(homepage.to_string()));
    }

    let mut install = Table::new();
    match tables::install_recipes_for(simple_name) {
        Some(recipes) => {
            for recipe in recipes {
                let value = match recipe.commands {
                    [command] => Value::String((*command).to_string()),
                    commands => Value::Array(
                        commands
                            .iter()
                            .map(|command| Value::String((*command).to_string()))
                            .collect(),
                    ),
                };
                install.insert(recipe.platform.to_string(), value);
            }
        }
        None => {
            install.insert(
                "linux".to_string(),
                Value::String(format!("sudo apt-get install -y {simple_name}")),
            );
            install.insert(
                "macos".to_string(),
                Value::String(format!("brew install {simple_name}")),
            );
        }
    }
    entry.insert("install".to_string(), Value::Table(install));
    entry
}

fn ensure_table_path<'a>(root: &'a mut Table, path: &[&str]) -> Result<&'a mut Table> {
    let mut current = root;
    for key in path {
        let entry = current
            .entry((*key).to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        current = entry
            .as_table_mut()
            .with_context(|| format!("[{key}] exists but is not a table"))?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_package_names() {
        assert_eq!(normalize_package_name("libsndfile1"), "sndfile");
        assert_eq!(normalize_package_name("unixodbc-dev"), "unixodbc");
        assert_eq!(normalize_package_name("FFmpeg"), "ffmpeg");
        assert_eq!(normalize_package_name("zlib1g-dev"), "zlib1g");
    }

    #[test]
    fn guesses_depurls_from_static_table() {
        assert_eq!(guess_depurl("ffmpeg"), "dep:generic/ffmpeg");
        assert_eq!(guess_depurl("gcc"), "dep:virtual/compiler/c");
        // Raw name hits before normalization.
        assert_eq!(guess_depurl("libsndfile1"), "dep:generic/libsndfile");
        assert_eq!(guess_depurl("unixodbc-dev"), "dep:generic/unixodbc");
        assert_eq!(guess_depurl("libsndfile1"), guess_depurl("libsndfile"));
        assert_eq!(guess_depurl("unixodbc-dev"), guess_depurl("unixodbc"));
    }

    #[test]
    fn guess_falls_back_to_generic() {
        assert_eq!(guess_depurl("somethingodd"), "dep:generic/somethingodd");
        assert_eq!(guess_depurl("libweird2"), "dep:generic/weird");
    }

    #[test]
    fn preview_quotes_depurls_and_recipes() {
        let analysis = MigrationAnalysis {
            has_legacy_system_deps: true,
            has_legacy_env_install: false,
            has_external_section: false,
            has_external_ops: false,
            legacy_packages: vec!["unixodbc".to_string(), "mystery-pkg".to_string()],
            legacy_platform_specific: BTreeMap::new(),
            current_depurls: Vec::new(),
            recommendations: Vec::new(),
            can_auto_migrate: true,
            source_path: None,
        };
        let preview = migration_preview(&analysis);
        assert!(preview.contains("[external]"));
        assert!(preview.contains("\"dep:generic/unixodbc\","));
        assert!(preview.contains("[tool.wads.external.ops.unixodbc]"));
        // Multi-command recipe renders as a TOML array.
        assert!(preview.contains("install.linux = ["));
        assert!(preview.contains("\"sudo apt-get update\","));
        // Unknown package gets the generic fallback.
        assert!(preview.contains("[tool.wads.external.ops.mystery-pkg]"));
        assert!(preview.contains("install.linux = \"sudo apt-get install -y mystery-pkg\""));
    }

    #[test]
    fn preview_without_legacy_packages_is_a_no_op_comment() {
        let analysis = MigrationAnalysis::absent("No pyproject.toml found");
        assert_eq!(
            migration_preview(&analysis),
            "# No legacy dependencies to migrate"
        );
    }

    #[test]
    fn instructions_mention_auto_migration_when_feasible() {
        let analysis = MigrationAnalysis {
            has_legacy_system_deps: true,
            has_legacy_env_install: false,
            has_external_section: false,
            has_external_ops: false,
            legacy_packages: vec!["ffmpeg".to_string()],
            legacy_platform_specific: BTreeMap::new(),
            current_depurls: Vec::new(),
            recommendations: vec!["Migrate".to_string()],
            can_auto_migrate: true,
            source_path: None,
        };
        let instructions = migration_instructions(&analysis);
        assert!(instructions.contains("AUTO-MIGRATED"));
        assert!(instructions.contains("\"ffmpeg\" -> \"dep:generic/ffmpeg\""));
    }

    #[test]
    fn quick_reference_names_every_subcommand() {
        let guide = quick_reference();
        for command in ["wads analyze", "wads preview", "wads apply", "wads instructions"] {
            assert!(guide.contains(command), "missing {command}");
        }
        assert!(guide.contains("dep:virtual/compiler/c"));
    }

    #[test]
    fn collects_legacy_packages_from_platform_mapping() {
        let value: Value = r#"
            ubuntu = ["ffmpeg", "unixodbc"]
            macos = ["ffmpeg"]
        "#
        .parse()
        .expect("parse platform mapping");
        let (packages, by_platform) = collect_legacy_packages(Some(&value));
        assert_eq!(packages, vec!["ffmpeg", "unixodbc"]);
        assert_eq!(by_platform["ubuntu"], vec!["ffmpeg", "unixodbc"]);
        assert_eq!(by_platform["macos"], vec!["ffmpeg"]);
    }
}
