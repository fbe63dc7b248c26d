//! Advisory diagnostics produced by ledger reconciliation.
//!
//! All of them are warnings; none of these fail a build. They point at style
//! modules and classes that drifted apart from the templates using them.

use std::fmt;

use pochoir_carton::CompactString;

/// Kind of ledger diagnostic.
///
/// Variant order is the order diagnostics of one module are reported in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LedgerDiagnosticKind {
    /// Module defines classes, but no template imports it.
    UnusedStyleModule,
    /// Templates import a module that has no definitions at all.
    MissingStyleModule,
    /// Class is defined, but no template uses it.
    UnusedClass { class_name: CompactString },
    /// Class is used, but the module does not define it.
    MissingClass { class_name: CompactString },
}

/// A reconciliation finding for one style module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDiagnostic {
    /// Module path the finding is about.
    pub module: CompactString,
    pub kind: LedgerDiagnosticKind,
    /// Human-readable message.
    pub message: String,
}

impl LedgerDiagnostic {
    /// Create a finding for `module`; the message is derived from `kind`.
    pub fn new(module: impl Into<CompactString>, kind: LedgerDiagnosticKind) -> Self {
        let module = module.into();
        let message = match &kind {
            LedgerDiagnosticKind::UnusedStyleModule => format!(
                "Unused CSS. It looks like you defined some scoped styles in {} but you didn't use them anywhere.",
                module
            ),
            LedgerDiagnosticKind::MissingStyleModule => format!(
                "Missing CSS. It looks like you tried to import styles from {}, but that file doesn't exist.",
                module
            ),
            LedgerDiagnosticKind::UnusedClass { class_name } => format!(
                "Unused CSS. It looks like you defined a \"{}\" class in {} but you didn't use it anywhere.",
                class_name, module
            ),
            LedgerDiagnosticKind::MissingClass { class_name } => format!(
                "Missing CSS. It looks like you tried to use \"{}\" class imported from {} in your templates, but that file doesn't define a CSS class with that name.",
                class_name, module
            ),
        };
        Self {
            module,
            kind,
            message,
        }
    }

    /// Class the finding is about, if any.
    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            LedgerDiagnosticKind::UnusedClass { class_name }
            | LedgerDiagnosticKind::MissingClass { class_name } => Some(class_name.as_str()),
            _ => None,
        }
    }

    /// Get the diagnostic code (for filtering/configuration).
    pub fn code(&self) -> &'static str {
        match &self.kind {
            LedgerDiagnosticKind::UnusedStyleModule => "pochoir/unused-style-module",
            LedgerDiagnosticKind::MissingStyleModule => "pochoir/missing-style-module",
            LedgerDiagnosticKind::UnusedClass { .. } => "pochoir/unused-class",
            LedgerDiagnosticKind::MissingClass { .. } => "pochoir/missing-class",
        }
    }

    /// Deterministic report order: module, then kind, then class.
    pub(crate) fn sort_key(&self) -> (&str, &LedgerDiagnosticKind) {
        (self.module.as_str(), &self.kind)
    }
}

impl fmt::Display for LedgerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning[{}]: {}", self.code(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_codes() {
        let cases = [
            (LedgerDiagnosticKind::UnusedStyleModule, "pochoir/unused-style-module"),
            (LedgerDiagnosticKind::MissingStyleModule, "pochoir/missing-style-module"),
            (
                LedgerDiagnosticKind::UnusedClass { class_name: "a".into() },
                "pochoir/unused-class",
            ),
            (
                LedgerDiagnosticKind::MissingClass { class_name: "a".into() },
                "pochoir/missing-class",
            ),
        ];
        for (kind, code) in cases {
            let diag = LedgerDiagnostic::new("my-app/card/styles.scoped.scss", kind);
            assert_eq!(diag.code(), code);
        }
    }

    #[test]
    fn test_display() {
        let diag = LedgerDiagnostic::new(
            "my-app/card/styles.scoped.scss",
            LedgerDiagnosticKind::UnusedClass {
                class_name: "title".into(),
            },
        );
        insta::assert_snapshot!(diag.to_string(), @r#"warning[pochoir/unused-class]: Unused CSS. It looks like you defined a "title" class in my-app/card/styles.scoped.scss but you didn't use it anywhere."#);
        assert_eq!(diag.class_name(), Some("title"));
    }

    #[test]
    fn test_kind_order() {
        assert!(LedgerDiagnosticKind::UnusedStyleModule < LedgerDiagnosticKind::MissingStyleModule);
        assert!(
            LedgerDiagnosticKind::UnusedClass { class_name: "z".into() }
                < LedgerDiagnosticKind::MissingClass { class_name: "a".into() }
        );
    }
}
