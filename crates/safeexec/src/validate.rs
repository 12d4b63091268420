//! Input validation performed before any process is created.
//!
//! The executors call [`validate_command`] and [`validate_arguments`] and fail
//! fast with a descriptive error. [`is_valid_package_name`] and
//! [`is_valid_filename`] are boolean predicates for check-before-construct use.

use std::ffi::OsStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::SafeExecError;
use crate::Result;

/// Letters, digits, dot, underscore, hyphen and forward slash. Excludes every
/// shell metacharacter and all whitespace.
static COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._/-]+$").expect("valid command regex"));

/// npm-style identifier with an optional `@scope/` prefix, lowercase only.
static PACKAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(@[a-z0-9~-][a-z0-9._~-]*/)?[a-z0-9~-][a-z0-9._~-]*$")
        .expect("valid package regex")
});

static FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid filename regex"));

/// Reject command names containing anything outside `[A-Za-z0-9._/-]`.
pub fn validate_command(command: &str) -> Result<()> {
    if !COMMAND_RE.is_match(command) {
        return Err(SafeExecError::InvalidCommand(command.to_string()));
    }
    Ok(())
}

/// Reject arguments that are not strings.
///
/// Arguments reach the OS as discrete argv entries, so the only remaining
/// confusion is an argument that is not text at all: an `OsStr` that does not
/// decode as UTF-8.
pub fn validate_arguments<S: AsRef<OsStr>>(args: &[S]) -> Result<()> {
    for (index, arg) in args.iter().enumerate() {
        if arg.as_ref().to_str().is_none() {
            return Err(SafeExecError::InvalidArgumentType {
                index,
                kind: "non-UTF-8 OS string".to_string(),
            });
        }
    }
    Ok(())
}

/// Convert dynamically typed arguments (e.g. from a JSON request) to strings.
///
/// Fails with [`SafeExecError::InvalidArgumentType`] naming the JSON type of the
/// first element that is not a string. Numbers are not coerced.
pub fn arguments_from_json(values: &[Value]) -> Result<Vec<String>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(SafeExecError::InvalidArgumentType {
                index,
                kind: json_type_name(other).to_string(),
            }),
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check an npm/pnpm package name.
pub fn is_valid_package_name(name: &str) -> bool {
    PACKAGE_RE.is_match(name)
}

/// Check a bare filename: no separators, no `..`, no shell metacharacters.
pub fn is_valid_filename(name: &str) -> bool {
    FILENAME_RE.is_match(name) && !name.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_plain_and_path_commands() {
        for cmd in ["echo", "/usr/bin/env", "my-tool.sh", "./bin/run_it", "python3"] {
            assert!(validate_command(cmd).is_ok(), "{cmd} should be accepted");
        }
    }

    #[test]
    fn test_rejects_metacharacters_in_commands() {
        for cmd in [
            "echo; ls", "echo hello", "cat|sh", "a&&b", "$(id)", "`id`", "a>b", "a<b", "~/bin",
            "rm *", "what?", "x!", "{a,b}", "a[0]", "'q'", "\"q\"", "tab\there", "new\nline", "",
        ] {
            assert!(
                matches!(validate_command(cmd), Err(SafeExecError::InvalidCommand(_))),
                "{cmd:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_string_arguments_pass() {
        assert!(validate_arguments(&["test; ls", "$(rm -rf /)", ""]).is_ok());
        let empty: [&str; 0] = [];
        assert!(validate_arguments(&empty).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_argument_rejected() {
        use std::os::unix::ffi::OsStrExt;

        let bad = OsStr::from_bytes(&[0x66, 0x6f, 0xff]);
        let args = [OsStr::new("ok"), bad];
        match validate_arguments(&args) {
            Err(SafeExecError::InvalidArgumentType { index, .. }) => assert_eq!(index, 1),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_arguments_from_json() {
        let args = arguments_from_json(&[json!("a"), json!("b c")]).unwrap();
        assert_eq!(args, vec!["a".to_string(), "b c".to_string()]);

        let err = arguments_from_json(&[json!("a"), json!(123)]).unwrap_err();
        assert!(err.to_string().contains("Invalid argument type: number"));

        for (value, kind) in [
            (json!(null), "null"),
            (json!(true), "boolean"),
            (json!(["x"]), "array"),
            (json!({"x": 1}), "object"),
        ] {
            match arguments_from_json(&[value]) {
                Err(SafeExecError::InvalidArgumentType { kind: k, index }) => {
                    assert_eq!(k, kind);
                    assert_eq!(index, 0);
                }
                other => panic!("Unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn test_valid_package_names() {
        for name in ["express", "lodash", "body-parser", "@types/node", "@babel/core", "a.b_c~d"] {
            assert!(is_valid_package_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_package_names() {
        for name in [
            "Express",
            "../etc/passwd",
            "pkg; rm -rf",
            "package&& ls",
            "",
            "@Scope/pkg",
            "@scope/",
            "a/b",
            "_private",
            ".hidden",
        ] {
            assert!(!is_valid_package_name(name), "{name:?} should be invalid");
        }
    }

    #[test]
    fn test_valid_filenames() {
        for name in ["file.txt", "my-file_2.json", "data.csv", "README"] {
            assert!(is_valid_filename(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_filenames() {
        for name in [
            "../etc/passwd",
            "file/with/path",
            "file;rm",
            "file&ls",
            "file|cat",
            "..",
            "a..b",
            "back\\slash",
            "",
        ] {
            assert!(!is_valid_filename(name), "{name:?} should be invalid");
        }
    }
}
