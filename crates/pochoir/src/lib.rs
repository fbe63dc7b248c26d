//! # Pochoir
//!
//! Build-time scoped class names for templates and style modules.
//!
//! Every class selector of a `*.scoped.scss` module is renamed to a name
//! derived from the class and the module path. Templates import a module under
//! an alias (`{{import s from './styles.scoped.scss'}}`) and reference its
//! classes as `s.title`; the same name is computed on both sides.
//!
//! ## Crates
//!
//! - [`carton`] - Hashing, path and naming utilities
//! - [`relief`] - Template AST, source locations and errors
//! - [`armature`] - Template parser and printer
//! - [`croquis`] - Cross-file usage ledger
//! - [`atelier_style`] - Style module rewriter
//! - [`atelier_template`] - Template rewriter
//!
//! ## Example
//!
//! ```
//! use pochoir::session::{BuildOptions, BuildSession};
//! use pochoir::tree::{InputFile, InputKind};
//!
//! let session = BuildSession::new(BuildOptions {
//!     namespace: "my-app".to_string(),
//!     ..Default::default()
//! });
//! let report = session.run(&[InputFile::new(
//!     InputKind::Style,
//!     "components/card/styles.scoped.scss",
//!     ".title { color: red; }",
//! )]);
//! assert!(report.is_success());
//! assert_eq!(report.styles[0].relative_path, "components/card/styles.pod.scss");
//! ```

pub mod config;
pub mod error;
pub mod session;
pub mod tree;

/// Hashing, path and naming utilities.
pub use pochoir_carton as carton;

/// Template AST, source locations and errors.
pub use pochoir_relief as relief;

/// Template parser and printer.
pub use pochoir_armature as armature;

/// Cross-file usage ledger.
pub use pochoir_croquis as croquis;

/// Style module rewriter.
pub use pochoir_atelier_style as atelier_style;

/// Template rewriter.
pub use pochoir_atelier_template as atelier_template;

pub use config::{load_config, PochoirConfig};
pub use error::{BuildError, BuildResult};
pub use session::{BuildOptions, BuildReport, BuildSession, FileFailure};
