//! Literal-substring denylist for shell commands.
//!
//! This is a screen for obviously destructive commands, not a sandbox: a
//! command is refused when any pattern occurs verbatim inside it.

use tracing::warn;

/// The first pattern found inside `command`, if any.
pub fn find_blocked<'a>(command: &str, patterns: &'a [String]) -> Option<&'a str> {
    let hit = patterns
        .iter()
        .map(String::as_str)
        .filter(|p| !p.is_empty())
        .find(|p| command.contains(p));

    if let Some(pattern) = hit {
        warn!(pattern = %pattern, "Refusing command matching denylist");
    }
    hit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        ["rm -rf /", "sudo rm", "chmod 777 /", "> /dev/sda"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn dangerous_command_is_blocked() {
        let patterns = defaults();
        assert_eq!(find_blocked("rm -rf / --no-preserve-root", &patterns), Some("rm -rf /"));
        assert_eq!(find_blocked("cd /tmp && sudo rm x", &patterns), Some("sudo rm"));
    }

    #[test]
    fn harmless_command_passes() {
        let patterns = defaults();
        assert_eq!(find_blocked("echo hi", &patterns), None);
        assert_eq!(find_blocked("rm -rf build", &patterns), None);
    }

    #[test]
    fn empty_patterns_never_match() {
        assert_eq!(find_blocked("anything", &[String::new()]), None);
        assert_eq!(find_blocked("anything", &[]), None);
    }
}
