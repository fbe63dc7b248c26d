//! # pochoir_atelier_style
//!
//! Atelier Style - The style module workshop for Pochoir.
//!
//! ## Name Origin
//!
//! **Atelier** (/a.tə.lje/) is the French word for an artist's workshop. This
//! atelier takes one SCSS style module at a time and cuts its class selectors
//! into scoped identifiers, leaving everything else exactly as written.
//!
//! ## Pipeline
//!
//! ```text
//! source ─parse_stylesheet─> Stylesheet ─rewrite─> StyleOutput
//!                                                     └─> UsageLedger (definitions)
//! ```
//!
//! ## Example
//!
//! ```
//! use pochoir_atelier_style::{rewrite_style, StyleOptions};
//! use pochoir_carton::NamingScheme;
//! use pochoir_croquis::UsageLedger;
//!
//! let ledger = UsageLedger::new();
//! let options = StyleOptions {
//!     naming: NamingScheme::Prefixed,
//!     ..Default::default()
//! };
//! let output = rewrite_style(
//!     ".card-title { font-weight: bold; }",
//!     "my-app",
//!     "app/components/card/pod-styles.scoped.scss",
//!     &options,
//!     &ledger,
//! )
//! .unwrap();
//! assert_eq!(output.code, ".card_card-title_4e461 { font-weight: bold; }");
//! assert_eq!(output.target_path, "app/components/card/pod-styles.pod.scss");
//! ```

mod parser;
mod rewrite;
mod stylesheet;

pub use parser::parse_stylesheet;
pub use rewrite::{
    class_selector_name, rewrite_style, ClassDefinition, StyleOptions, StyleOutput, TraversalMode,
    SOURCE_EXTENSION, TARGET_EXTENSION,
};
pub use stylesheet::{AtRuleNode, CommentNode, DeclarationNode, RuleNode, StyleNode, Stylesheet};
