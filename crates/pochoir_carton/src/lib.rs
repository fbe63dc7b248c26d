//! Carton - The artist's toolbox for Pochoir.
//!
//! This crate holds the small, dependency-free pieces every other Pochoir crate
//! reaches for, much like a carton (artist's portfolio case) holds the tools an
//! artist carries from one workshop to the next.
//!
//! # Modules
//!
//! - **hash**: xxHash3 digests used for scoped identifiers
//! - **path**: forward-slash module path normalization
//! - **naming**: the scoped name generator shared by the style and template rewriters
//!
//! # Example
//!
//! ```
//! use pochoir_carton::naming::{scoped_name, NamingScheme};
//!
//! let unix = "my-app/components/button/styles.scoped.scss";
//! let windows = "my-app\\components\\button\\styles.scoped.scss";
//! let a = scoped_name("primary", unix, NamingScheme::Flat);
//! let b = scoped_name("primary", windows, NamingScheme::Flat);
//! assert_eq!(a, b);
//! assert!(a.starts_with("primary_"));
//! ```

pub mod hash;
pub mod naming;
pub mod path;

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

pub use naming::{scoped_name, NamingScheme};
pub use path::normalize_path;
