//! Module path helpers.
//!
//! Module paths are the keys both rewriters feed into the naming function, so
//! they are always compared in one canonical form: forward slashes, no `.`
//! segments, `..` folded where possible and no repeated separators.

/// Normalize a module path.
///
/// ```
/// use pochoir_carton::path::normalize_path;
///
/// assert_eq!(
///     normalize_path("my-app\\components\\.\\card//styles.scss"),
///     "my-app/components/card/styles.scss"
/// );
/// assert_eq!(
///     normalize_path("my-app/components/card/../button/styles.scss"),
///     "my-app/components/button/styles.scss"
/// );
/// ```
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let rooted = unified.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                // `..` above the root of a rooted path has nowhere to go
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Whether the path is rooted (`/x`, `\x`) rather than relative.
#[inline]
pub fn is_rooted(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\')
}

/// Everything before the last separator, or `""` when there is none.
pub fn dirname(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Name of the directory directly containing `path`, if any.
pub fn parent_dir_name(path: &str) -> Option<&str> {
    let parent = dirname(path);
    if parent.is_empty() {
        return None;
    }
    let name = match parent.rfind(['/', '\\']) {
        Some(pos) => &parent[pos + 1..],
        None => parent,
    };
    (!name.is_empty() && name != "." && name != "..").then_some(name)
}

/// Join `relative` onto `base` and normalize the result.
pub fn join(base: &str, relative: &str) -> String {
    if base.is_empty() {
        return normalize_path(relative);
    }
    let mut joined = String::with_capacity(base.len() + relative.len() + 1);
    joined.push_str(base);
    joined.push('/');
    joined.push_str(relative);
    normalize_path(&joined)
}

/// Replace a multi-dot `from` extension (e.g. `scoped.scss`) with `to`.
///
/// Returns `None` when `path` does not end in `.{from}`.
pub fn swap_extension(path: &str, from: &str, to: &str) -> Option<String> {
    let stem = path.strip_suffix(from)?.strip_suffix('.')?;
    let mut swapped = String::with_capacity(stem.len() + to.len() + 1);
    swapped.push_str(stem);
    swapped.push('.');
    swapped.push_str(to);
    Some(swapped)
}
