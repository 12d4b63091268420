//! Last-resort quoting for contexts forced to build a shell string.
//!
//! Prefer argv-based execution through [`safe_execute`](crate::safe_execute)
//! or [`safe_spawn`](crate::safe_spawn); nothing in this crate passes its
//! output to a shell.

/// Quote `s` for a POSIX shell.
///
/// Wraps the input in single quotes and replaces each embedded `'` with
/// `'\''` (close quote, escaped quote, reopen quote). Applying it twice
/// double-wraps.
pub fn escape_shell_arg(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}
