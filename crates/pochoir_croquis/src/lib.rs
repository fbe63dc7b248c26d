//! # pochoir_croquis
//!
//! Croquis - The cross-file usage ledger for Pochoir.
//!
//! ## Name Origin
//!
//! **Croquis** (/kʁɔ.ki/) is a French term for a quick, sketchy drawing that captures
//! the essential features of a subject. `pochoir_croquis` keeps a quick sketch of
//! the whole project: which classes every style module defines and which of them
//! the templates actually use.
//!
//! ## Architecture
//!
//! ```text
//! pochoir_atelier_style ──register_defined_class──┐
//!                                                 ├──> UsageLedger ──reconcile──> Vec<LedgerDiagnostic>
//! pochoir_atelier_template ─register_used_class───┘
//! ```
//!
//! Both rewriters append to the ledger through `&self`, so any number of files
//! can be processed in parallel. [`UsageLedger::reconcile`] takes the ledger by
//! value: nothing can register after reconciliation started.

mod diagnostics;
mod ledger;

pub use diagnostics::{LedgerDiagnostic, LedgerDiagnosticKind};
pub use ledger::UsageLedger;
