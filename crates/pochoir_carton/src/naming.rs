//! Scoped name generation.
//!
//! The style rewriter and the template rewriter never talk to each other. They
//! agree on a class name only because both call [`scoped_name`] with the same
//! class and the same module path, so this function must stay pure: no state,
//! no environment, no randomness.

use serde::{Deserialize, Serialize};

use crate::hash::short_digest;
use crate::path::{normalize_path, parent_dir_name};

/// Number of hex characters kept from the digest.
pub const DIGEST_LEN: usize = 5;

/// Separator between the class name and the module path in the hash key.
const KEY_SEPARATOR: &str = "--";

/// Shape of generated identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    /// `<class>_<digest>`
    #[default]
    Flat,
    /// `<parent dir>_<class>_<digest>`
    Prefixed,
}

impl NamingScheme {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Prefixed => "prefixed",
        }
    }
}

/// Key hashed for a class: `<class>--<normalized module path>`.
pub fn hash_key(class_name: &str, module_path: &str) -> String {
    let module_path = normalize_path(module_path);
    let mut key = String::with_capacity(class_name.len() + KEY_SEPARATOR.len() + module_path.len());
    key.push_str(class_name);
    key.push_str(KEY_SEPARATOR);
    key.push_str(&module_path);
    key
}

/// Generate the scoped identifier for `class_name` defined in `module_path`.
///
/// ```
/// use pochoir_carton::naming::{scoped_name, NamingScheme};
///
/// let name = scoped_name(
///     "card-title",
///     "my-app/app/components/card/pod-styles.scoped.scss",
///     NamingScheme::Prefixed,
/// );
/// assert_eq!(name, "card_card-title_4e461");
/// ```
pub fn scoped_name(class_name: &str, module_path: &str, scheme: NamingScheme) -> String {
    let module_path = normalize_path(module_path);
    let digest = short_digest(&hash_key(class_name, &module_path), DIGEST_LEN);

    let prefix = match scheme {
        NamingScheme::Flat => None,
        NamingScheme::Prefixed => parent_dir_name(&module_path),
    };

    let mut name = String::with_capacity(
        prefix.map_or(0, |p| p.len() + 1) + class_name.len() + 1 + digest.len(),
    );
    if let Some(prefix) = prefix {
        name.push_str(prefix);
        name.push('_');
    }
    name.push_str(class_name);
    name.push('_');
    name.push_str(&digest);
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let module = "my-app/components/button/styles.scoped.scss";
        let a = scoped_name("primary", module, NamingScheme::Flat);
        let b = scoped_name("primary", module, NamingScheme::Flat);
        assert_eq!(a, b);
    }

    #[test]
    fn test_flat_shape() {
        let name = scoped_name(
            "primary",
            "my-app/components/button/styles.scoped.scss",
            NamingScheme::Flat,
        );
        let (class, digest) = name.rsplit_once('_').unwrap();
        assert_eq!(class, "primary");
        assert_eq!(digest.len(), DIGEST_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_golden_prefixed() {
        insta::assert_snapshot!(
            scoped_name(
                "card-title",
                "my-app/app/components/card/pod-styles.scoped.scss",
                NamingScheme::Prefixed
            ),
            @"card_card-title_4e461"
        );
    }

    #[test]
    fn test_golden_flat() {
        insta::assert_snapshot!(
            scoped_name(
                "card-title",
                "my-app/app/components/card/pod-styles.scoped.scss",
                NamingScheme::Flat
            ),
            @"card-title_4e461"
        );
    }

    #[test]
    fn test_separator_insensitive() {
        assert_eq!(
            scoped_name("a", "ns\\components\\x\\styles.scoped.scss", NamingScheme::Prefixed),
            scoped_name("a", "ns/components/x/styles.scoped.scss", NamingScheme::Prefixed)
        );
        assert_eq!(
            scoped_name("a", "ns/components/y/../x/styles.scoped.scss", NamingScheme::Flat),
            scoped_name("a", "ns/components/x/styles.scoped.scss", NamingScheme::Flat)
        );
    }

    #[test]
    fn test_module_path_changes_digest() {
        assert_ne!(
            scoped_name("a", "ns/one/styles.scoped.scss", NamingScheme::Flat),
            scoped_name("a", "ns/two/styles.scoped.scss", NamingScheme::Flat)
        );
    }

    #[test]
    fn test_prefixed_without_parent_falls_back_to_flat() {
        assert_eq!(
            scoped_name("a", "styles.scoped.scss", NamingScheme::Prefixed),
            scoped_name("a", "styles.scoped.scss", NamingScheme::Flat)
        );
    }

    #[test]
    fn test_hash_key() {
        assert_eq!(
            hash_key("card-title", "my-app\\app\\components\\card\\pod-styles.scoped.scss"),
            "card-title--my-app/app/components/card/pod-styles.scoped.scss"
        );
    }
}
