//! Path canonicalization so that report paths, API paths and workspace paths
//! can be compared as plain strings.

/// Convert separators to `/` and strip `prefix` when the path starts with it.
///
/// The prefix is stripped repeatedly, so normalizing an already normalized
/// path is a no-op. An unmatched prefix leaves the (separator-normalized)
/// path as it was.
///
/// ```
/// use lcov_reporter::path::normalize;
///
/// assert_eq!(normalize("C:\\work\\src\\a.js", "C:/work/"), "src/a.js");
/// assert_eq!(normalize("/other/a.js", "/work/"), "/other/a.js");
/// ```
pub fn normalize(path: &str, prefix: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    let prefix = prefix.replace('\\', "/");
    if prefix.is_empty() {
        return normalized;
    }

    while let Some(rest) = normalized.strip_prefix(prefix.as_str()) {
        normalized = rest.to_string();
    }
    normalized
}

/// Normalize a report path and place it under `working_dir`, giving the
/// repository-relative path GitHub uses for changed files and blob links.
pub fn repo_relative(path: &str, prefix: &str, working_dir: &str) -> String {
    let normalized = normalize(path, prefix);
    let working_dir = normalize(working_dir, "");
    let working_dir = strip_dot_segments(&working_dir).trim_end_matches('/');

    if working_dir.is_empty() || working_dir == "." {
        return strip_dot_segments(&normalized).to_string();
    }

    let relative = strip_dot_segments(&normalized);
    if relative.starts_with('/') || relative.starts_with(&format!("{working_dir}/")) {
        // Absolute paths outside the prefix, and paths that already carry
        // the working directory, are left alone.
        return relative.to_string();
    }
    format!("{working_dir}/{relative}")
}

fn strip_dot_segments(path: &str) -> &str {
    let mut path = path;
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize("src\\lib\\a.js", ""), "src/lib/a.js");
    }

    #[test]
    fn test_normalize_strips_prefix() {
        assert_eq!(
            normalize("/home/runner/work/repo/src/a.js", "/home/runner/work/repo/"),
            "src/a.js"
        );
    }

    #[test]
    fn test_normalize_prefix_with_backslashes() {
        assert_eq!(normalize("D:\\a\\repo\\src\\a.js", "D:\\a\\repo\\"), "src/a.js");
    }

    #[test]
    fn test_normalize_unmatched_prefix() {
        assert_eq!(normalize("lib\\a.js", "/work/"), "lib/a.js");
    }

    #[test]
    fn test_normalize_idempotent() {
        let cases = [
            ("a/a/b.js", "a/"),
            ("/w/src/x.rs", "/w/"),
            ("src\\x.rs", "src"),
            ("", "x/"),
            ("plain.rs", ""),
        ];
        for (path, prefix) in cases {
            let once = normalize(path, prefix);
            assert_eq!(normalize(&once, prefix), once, "path={path} prefix={prefix}");
        }
    }

    #[test]
    fn test_repo_relative_default_working_dir() {
        assert_eq!(repo_relative("src/a.js", "", "./"), "src/a.js");
        assert_eq!(repo_relative("./src/a.js", "", ""), "src/a.js");
        assert_eq!(repo_relative("/ws/src/a.js", "/ws/", "."), "src/a.js");
    }

    #[test]
    fn test_repo_relative_nested_working_dir() {
        assert_eq!(repo_relative("src/a.js", "", "./packages/web"), "packages/web/src/a.js");
        assert_eq!(repo_relative("src/a.js", "", "packages/web/"), "packages/web/src/a.js");
    }

    #[test]
    fn test_repo_relative_already_under_working_dir() {
        assert_eq!(
            repo_relative("/ws/packages/web/src/a.js", "/ws/", "packages/web"),
            "packages/web/src/a.js"
        );
    }
}
