//! Structured diagnostics for the dependency-resolution engine.
//!
//! Unresolvable DepURLs and deprecated declarations are never fatal: CI
//! fragment generation always completes with the best-effort command list it
//! can produce. Callers pass a sink in and inspect it afterwards, so tests can
//! assert on diagnostics without capturing global state.

/// How serious a diagnostic is. Nothing here aborts generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Deprecation,
}

/// A single non-fatal finding emitted during resolution.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Ordered collection of diagnostics emitted during one resolution call.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message.into());
    }

    pub fn deprecation(&mut self, message: impl Into<String>) {
        self.push(Severity::Deprecation, message.into());
    }

    fn push(&mut self, severity: Severity, message: String) {
        tracing::warn!("{message}");
        self.entries.push(Diagnostic { severity, message });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Count of entries with the given severity.
    pub fn count_of(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_emission_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn("first");
        diagnostics.deprecation("second");

        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert_eq!(diagnostics.count_of(Severity::Warning), 1);
        assert_eq!(diagnostics.count_of(Severity::Deprecation), 1);
        assert_eq!(diagnostics.len(), 2);
        assert!(!diagnostics.is_empty());
    }
}
