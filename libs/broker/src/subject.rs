//! Dotted-tuple subject grammar shared by the dispatcher and the worker.
//!
//! `exec`/`res` subjects are built and parsed here so both sides of the
//! broker agree on the grammar without duplicating string formatting.

/// Tokens forbidden in any path segment used to build a subject, mirroring
/// the wire-format invariant that subject tokens exclude `.`, `*`, `>`.
const FORBIDDEN: [char; 3] = ['.', '*', '>'];

#[derive(Debug, thiserror::Error)]
pub enum SubjectError {
    #[error("subject token {0:?} contains a reserved character ('.', '*' or '>')")]
    ReservedCharacter(String),
}

fn check_token(token: &str) -> Result<(), SubjectError> {
    if token.is_empty() || token.chars().any(|c| FORBIDDEN.contains(&c)) {
        return Err(SubjectError::ReservedCharacter(token.to_owned()));
    }
    Ok(())
}

/// Builds the `<project>.<name>.exec.<language>.<request_id>` exec subject.
pub fn exec_subject(
    project: &str,
    name: &str,
    language: &str,
    request_id: &str,
) -> Result<String, SubjectError> {
    check_token(project)?;
    check_token(name)?;
    check_token(language)?;
    check_token(request_id)?;
    Ok(format!("{project}.{name}.exec.{language}.{request_id}"))
}

/// Builds the `<project>.<name>.res.<language>.<request_id>` res subject.
pub fn res_subject(
    project: &str,
    name: &str,
    language: &str,
    request_id: &str,
) -> Result<String, SubjectError> {
    check_token(project)?;
    check_token(name)?;
    check_token(language)?;
    check_token(request_id)?;
    Ok(format!("{project}.{name}.res.{language}.{request_id}"))
}

/// Builds the `<project>.hook.<language>` runtime-hook subject.
pub fn hook_subject(project: &str, language: &str) -> Result<String, SubjectError> {
    check_token(project)?;
    check_token(language)?;
    Ok(format!("{project}.hook.{language}"))
}

/// Wildcard exec subject a per-function (compiled-language) worker binds to.
pub fn exec_wildcard(project: &str, name: &str, language: &str) -> Result<String, SubjectError> {
    check_token(project)?;
    check_token(name)?;
    check_token(language)?;
    Ok(format!("{project}.{name}.exec.{language}.*"))
}

/// Wildcard exec subject a shared (dynamic-language) worker binds to: the
/// function name is inferred from the second token of the received subject.
pub fn exec_wildcard_shared(project: &str, language: &str) -> Result<String, SubjectError> {
    check_token(project)?;
    check_token(language)?;
    Ok(format!("{project}.*.exec.{language}.*"))
}

/// Extracts `request_id`, the last dotted segment of a subject.
pub fn request_id_from_subject(subject: &str) -> &str {
    subject.rsplit('.').next().unwrap_or_default()
}

/// Extracts the function name, the second dotted segment of an exec subject,
/// used by shared workers to learn which function a message belongs to.
pub fn name_from_exec_subject(subject: &str) -> Option<&str> {
    subject.split('.').nth(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_exec_and_res_subjects() {
        assert_eq!(
            exec_subject("alpha", "echo", "go", "abc12345").unwrap(),
            "alpha.echo.exec.go.abc12345"
        );
        assert_eq!(
            res_subject("alpha", "echo", "go", "abc12345").unwrap(),
            "alpha.echo.res.go.abc12345"
        );
    }

    #[test]
    fn builds_hook_subject() {
        assert_eq!(hook_subject("alpha", "go").unwrap(), "alpha.hook.go");
    }

    #[test]
    fn rejects_reserved_characters() {
        assert!(exec_subject("al.pha", "echo", "go", "id").is_err());
        assert!(exec_subject("alpha", "ec*ho", "go", "id").is_err());
        assert!(hook_subject("alpha", "go>").is_err());
    }

    #[test]
    fn extracts_request_id_from_subject() {
        assert_eq!(
            request_id_from_subject("alpha.echo.res.go.abc12345"),
            "abc12345"
        );
    }

    #[test]
    fn extracts_name_from_shared_worker_exec_subject() {
        assert_eq!(
            name_from_exec_subject("alpha.echo.exec.go.abc12345"),
            Some("echo")
        );
    }
}
