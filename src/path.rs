//! Validation and decomposition of folder paths.
//!
//! A valid path is `/` or `/c1/c2/.../cn/`, where each `ci` is a nonempty
//! run of lowercase ASCII letters of at most [`MAX_NAME`] bytes. The
//! trailing slash is mandatory.

/// Maximum length in bytes of a single path component.
pub const MAX_NAME: usize = 255;

/// Returns whether `path` satisfies the grammar above.
pub fn is_valid(path: &str) -> bool {
    if !path.starts_with('/') || !path.ends_with('/') {
        return false;
    }
    if path == "/" {
        return true;
    }
    let inner = &path[1..path.len() - 1];
    inner.split('/').all(is_valid_component)
}

fn is_valid_component(component: &str) -> bool {
    !component.is_empty()
        && component.len() <= MAX_NAME
        && component.bytes().all(|b| b.is_ascii_lowercase())
}

/// Splits a valid path into its ordered components. The root path `/`
/// yields an empty vector.
pub fn components(path: &str) -> Vec<String> {
    if path == "/" {
        return Vec::new();
    }
    let inner = &path[1..path.len() - 1];
    inner.split('/').map(String::from).collect()
}

/// Rebuilds a path string from a slice of components. An empty slice
/// rebuilds the root path.
pub fn join(components: &[String]) -> String {
    if components.is_empty() {
        return "/".to_string();
    }
    let mut out = String::with_capacity(components.iter().map(|c| c.len() + 1).sum::<usize>() + 1);
    out.push('/');
    for component in components {
        out.push_str(component);
        out.push('/');
    }
    out
}

/// Returns whether `target` lies strictly inside the subtree rooted at
/// `source`, i.e. `source` is a proper prefix of `target` aligned on a `/`
/// boundary. Both paths are assumed valid and to end in `/`, which makes
/// the boundary check a plain prefix test.
pub fn is_strict_prefix(source: &str, target: &str) -> bool {
    target.len() > source.len() && target.starts_with(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_valid() {
        assert!(is_valid("/"));
        assert_eq!(components("/"), Vec::<String>::new());
    }

    #[test]
    fn rejects_missing_slashes() {
        assert!(!is_valid(""));
        assert!(!is_valid("a/"));
        assert!(!is_valid("/a"));
    }

    #[test]
    fn rejects_empty_components() {
        assert!(!is_valid("//"));
        assert!(!is_valid("/a//b/"));
    }

    #[test]
    fn rejects_uppercase_and_digits() {
        assert!(!is_valid("/A/"));
        assert!(!is_valid("/a1/"));
        assert!(!is_valid("/a-b/"));
    }

    #[test]
    fn rejects_overlong_component() {
        let long = "a".repeat(MAX_NAME + 1);
        assert!(!is_valid(&format!("/{long}/")));
        let ok = "a".repeat(MAX_NAME);
        assert!(is_valid(&format!("/{ok}/")));
    }

    #[test]
    fn splits_components() {
        assert_eq!(
            components("/a/bb/ccc/"),
            vec!["a".to_string(), "bb".to_string(), "ccc".to_string()]
        );
    }

    #[test]
    fn join_roundtrips() {
        let path = "/a/bb/ccc/";
        assert_eq!(join(&components(path)), path);
        assert_eq!(join(&[]), "/");
    }

    #[test]
    fn strict_prefix() {
        assert!(is_strict_prefix("/a/", "/a/b/"));
        assert!(!is_strict_prefix("/a/", "/a/"));
        assert!(!is_strict_prefix("/a/b/", "/a/"));
        assert!(!is_strict_prefix("/a/", "/ab/"));
    }
}
