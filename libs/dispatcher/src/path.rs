//! URL path parsing for the lambda endpoints (invariant I5): for every
//! well-formed path in `{/lambda/p/n, /lambda/sse/p/n, /lambda/ws/p/n}`,
//! parsing yields `(p, n)`; otherwise both come back empty.

/// Parses `/lambda/<project>/<name>[/<tail>]`, returning `(project, name, tail)`.
/// `tail` defaults to `/` when absent, matching the proxy URL rewrite rule.
pub fn parse_lambda_path(path: &str) -> (String, String, String) {
    parse_prefixed(path, "/lambda/")
}

/// Parses `/lambda/sse/<project>/<name>`.
pub fn parse_sse_path(path: &str) -> (String, String, String) {
    parse_prefixed(path, "/lambda/sse/")
}

/// Parses `/lambda/ws/<project>/<name>`.
pub fn parse_ws_path(path: &str) -> (String, String, String) {
    parse_prefixed(path, "/lambda/ws/")
}

/// Parses `/hook/<language>/<project>`, returning `(language, project)`.
pub fn parse_hook_path(path: &str) -> (String, String) {
    let Some(rest) = path.strip_prefix("/hook/") else {
        return (String::new(), String::new());
    };
    let mut segments = rest.splitn(2, '/');
    let language = segments.next().unwrap_or_default();
    let project = segments.next().unwrap_or_default().trim_end_matches('/');
    if language.is_empty() || project.is_empty() {
        return (String::new(), String::new());
    }
    (language.to_owned(), project.to_owned())
}

fn parse_prefixed(path: &str, prefix: &str) -> (String, String, String) {
    let Some(rest) = path.strip_prefix(prefix) else {
        return (String::new(), String::new(), String::new());
    };
    let mut segments = rest.splitn(3, '/');
    let project = segments.next().unwrap_or_default();
    let name = segments.next().unwrap_or_default();
    if project.is_empty() || name.is_empty() {
        return (String::new(), String::new(), String::new());
    }
    let tail = match segments.next() {
        Some(t) if !t.is_empty() => format!("/{t}"),
        _ => "/".to_owned(),
    };
    (project.to_owned(), name.to_owned(), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sync_path() {
        assert_eq!(
            parse_lambda_path("/lambda/alpha/echo"),
            ("alpha".into(), "echo".into(), "/".into())
        );
    }

    #[test]
    fn parses_sync_path_with_tail() {
        assert_eq!(
            parse_lambda_path("/lambda/alpha/fast/sub/path"),
            ("alpha".into(), "fast".into(), "/sub/path".into())
        );
    }

    #[test]
    fn parses_sse_path() {
        assert_eq!(
            parse_sse_path("/lambda/sse/alpha/stream"),
            ("alpha".into(), "stream".into(), "/".into())
        );
    }

    #[test]
    fn parses_ws_path() {
        assert_eq!(
            parse_ws_path("/lambda/ws/alpha/chat"),
            ("alpha".into(), "chat".into(), "/".into())
        );
    }

    #[test]
    fn malformed_paths_yield_empty_tuple() {
        assert_eq!(
            parse_lambda_path("/lambda/alpha"),
            (String::new(), String::new(), String::new())
        );
        assert_eq!(
            parse_lambda_path("/not-lambda/alpha/echo"),
            (String::new(), String::new(), String::new())
        );
    }

    #[test]
    fn parses_hook_path() {
        assert_eq!(
            parse_hook_path("/hook/go/alpha"),
            ("go".into(), "alpha".into())
        );
    }

    #[test]
    fn malformed_hook_path_yields_empty_tuple() {
        assert_eq!(parse_hook_path("/hook/go"), (String::new(), String::new()));
    }
}
