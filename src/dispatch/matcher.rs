//! Route path joining and matching.
//!
//! # Responsibilities
//! - Join a router base with a mount path or route pattern
//! - Match a route pattern against a request path, binding `:name` segments
//!
//! # Design Decisions
//! - Exactly one trailing slash is ignored on both sides
//! - Segment count must be equal; literal segments compare case-sensitively
//! - Parameter segments match any non-empty value positionally
//! - No wildcards or regex

/// Join `prefix` and `path` into a normalized absolute path.
///
/// The result always starts with `/` and carries no trailing slash unless it
/// is the root itself.
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    let mut joined = String::with_capacity(prefix.len() + path.len() + 1);
    if !prefix.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(prefix);
    if !joined.ends_with('/') {
        joined.push('/');
    }
    joined.push_str(path);

    if joined.len() > 1 && joined.ends_with('/') {
        joined.pop();
    }
    joined
}

/// Drop a single trailing slash.
pub fn trim_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

/// Match `pattern` against `path`, returning the bound parameters on success.
pub fn match_pattern(pattern: &str, path: &str) -> Option<Vec<(String, String)>> {
    let pattern = trim_trailing_slash(pattern);
    let path = trim_trailing_slash(path);

    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = Vec::new();
    for (expected, actual) in pattern_segments.iter().zip(path_segments.iter()) {
        match expected.strip_prefix(':') {
            Some(name) if !name.is_empty() => {
                if actual.is_empty() {
                    return None;
                }
                params.push((name.to_string(), actual.to_string()));
            }
            _ => {
                if expected != actual {
                    return None;
                }
            }
        }
    }

    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/", "/"), "/");
        assert_eq!(join_paths("/", "/b"), "/b");
        assert_eq!(join_paths("/a", "/"), "/a");
        assert_eq!(join_paths("/a/", "/b/"), "/a/b");
        assert_eq!(join_paths("/a", "b"), "/a/b");
        assert_eq!(join_paths("", "x"), "/x");
    }

    #[test]
    fn test_trailing_slash_is_ignored_once() {
        assert!(match_pattern("/foo", "/foo/").is_some());
        assert!(match_pattern("/foo/", "/foo").is_some());
        assert!(match_pattern("/", "/").is_some());
        assert!(match_pattern("/foo", "/foo//").is_none());
    }

    #[test]
    fn test_literal_segments_must_match_exactly() {
        assert!(match_pattern("/a/b", "/a/b").is_some());
        assert!(match_pattern("/a/b", "/a").is_none());
        assert!(match_pattern("/a", "/a/b").is_none());
        assert!(match_pattern("/a/b", "/a/B").is_none());
        assert!(match_pattern("/", "/a").is_none());
    }

    #[test]
    fn test_params_bind_positionally() {
        let params = match_pattern("/users/:id", "/users/42").unwrap();
        assert_eq!(params, vec![("id".to_string(), "42".to_string())]);

        let params = match_pattern("/c/:cid/items/:iid", "/c/7/items/abc").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[1], ("iid".to_string(), "abc".to_string()));

        assert!(match_pattern("/users/:id", "/users").is_none());
        assert!(match_pattern("/users/:id", "/users/42/extra").is_none());
    }
}
