//! Validation of watch identifiers before they reach a command line.

/// Longest watch name accepted.
const MAX_WATCH_LEN: usize = 256;

/// Returns `true` if `watch` is safe to pass as a single argument to the control binary.
///
/// Accepted characters are ASCII alphanumerics and `_ . : -`. Empty strings,
/// leading dashes (option injection) and `..` (path traversal) are rejected.
pub fn is_watch_secure(watch: &str) -> bool {
    if watch.is_empty() || watch.len() > MAX_WATCH_LEN {
        return false;
    }
    if watch.starts_with('-') || watch.contains("..") {
        return false;
    }
    watch
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-'))
}

#[cfg(test)]
mod tests {
    use super::is_watch_secure;

    #[test]
    fn accepts_regular_watch_names() {
        for watch in ["mctl", "app___guestbook-8080", "datastore_server-4000", "uaserver.1", "zk:2181"] {
            assert!(is_watch_secure(watch), "{watch} should be accepted");
        }
    }

    #[test]
    fn rejects_shell_metacharacters_and_traversal() {
        for watch in [
            "",
            "; rm -rf /",
            "app && reboot",
            "$(id)",
            "`id`",
            "app|cat",
            "../etc/passwd",
            "a/b",
            "app\nstart",
            "-g",
            "app name",
        ] {
            assert!(!is_watch_secure(watch), "{watch:?} should be rejected");
        }
    }

    #[test]
    fn rejects_oversized_names() {
        assert!(!is_watch_secure(&"a".repeat(300)));
    }
}
