//! Thread-safe ledger of defined and used classes per style module.

use dashmap::DashMap;
use pochoir_carton::{CompactString, FxHashMap, FxHashSet};

use crate::diagnostics::{LedgerDiagnostic, LedgerDiagnosticKind};

type ClassTable = DashMap<CompactString, FxHashSet<CompactString>>;

/// Defined and used class names, keyed by module path.
///
/// Module paths must be normalized before they are registered; the ledger
/// compares them as plain strings.
#[derive(Debug, Default)]
pub struct UsageLedger {
    defined: ClassTable,
    used: ClassTable,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `module` defines `class_name`.
    pub fn register_defined_class(&self, module: &str, class_name: &str) {
        self.defined
            .entry(CompactString::from(module))
            .or_default()
            .insert(CompactString::from(class_name));
    }

    /// Record every class of a module that rewrote successfully, at once.
    ///
    /// A module that defines no class gets no entry.
    pub fn register_defined_classes<'c>(
        &self,
        module: &str,
        class_names: impl IntoIterator<Item = &'c str>,
    ) {
        let mut class_names = class_names.into_iter().peekable();
        if class_names.peek().is_none() {
            return;
        }
        let mut entry = self.defined.entry(CompactString::from(module)).or_default();
        let before = entry.len();
        entry.extend(class_names.map(CompactString::from));
        tracing::debug!(
            "ledger: {} defines {} new classes",
            module,
            entry.len() - before
        );
    }

    /// Record that a template used `class_name` from `module`.
    pub fn register_used_class(&self, module: &str, class_name: &str) {
        self.used
            .entry(CompactString::from(module))
            .or_default()
            .insert(CompactString::from(class_name));
    }

    /// Number of modules with at least one definition or usage.
    pub fn module_count(&self) -> usize {
        let mut modules: FxHashSet<CompactString> =
            self.defined.iter().map(|e| e.key().clone()).collect();
        modules.extend(self.used.iter().map(|e| e.key().clone()));
        modules.len()
    }

    /// Classes defined by `module`, sorted.
    pub fn defined_classes(&self, module: &str) -> Vec<CompactString> {
        sorted(self.defined.get(module).map(|set| set.value().clone()))
    }

    /// Classes used from `module`, sorted.
    pub fn used_classes(&self, module: &str) -> Vec<CompactString> {
        sorted(self.used.get(module).map(|set| set.value().clone()))
    }

    /// Compare definitions against usages.
    ///
    /// Consumes the ledger, so every registration has happened before the
    /// comparison starts. Diagnostics are sorted by module, kind and class.
    pub fn reconcile(self) -> Vec<LedgerDiagnostic> {
        let defined: FxHashMap<_, _> = self.defined.into_iter().collect();
        let used: FxHashMap<_, _> = self.used.into_iter().collect();
        let mut diagnostics = Vec::new();

        for (module, classes) in &defined {
            match used.get(module) {
                None => diagnostics.push(LedgerDiagnostic::new(
                    module.clone(),
                    LedgerDiagnosticKind::UnusedStyleModule,
                )),
                Some(used_classes) => {
                    diagnostics.extend(classes.difference(used_classes).map(|class_name| {
                        LedgerDiagnostic::new(
                            module.clone(),
                            LedgerDiagnosticKind::UnusedClass {
                                class_name: class_name.clone(),
                            },
                        )
                    }));
                }
            }
        }

        for (module, classes) in &used {
            match defined.get(module) {
                None => diagnostics.push(LedgerDiagnostic::new(
                    module.clone(),
                    LedgerDiagnosticKind::MissingStyleModule,
                )),
                Some(defined_classes) => {
                    diagnostics.extend(classes.difference(defined_classes).map(|class_name| {
                        LedgerDiagnostic::new(
                            module.clone(),
                            LedgerDiagnosticKind::MissingClass {
                                class_name: class_name.clone(),
                            },
                        )
                    }));
                }
            }
        }

        diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        tracing::debug!(
            "ledger: {} modules reconciled, {} findings",
            defined.len().max(used.len()),
            diagnostics.len()
        );
        diagnostics
    }
}

fn sorted(set: Option<FxHashSet<CompactString>>) -> Vec<CompactString> {
    let mut classes: Vec<_> = set.unwrap_or_default().into_iter().collect();
    classes.sort();
    classes
}
