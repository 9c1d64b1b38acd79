//! Rendering of supervisor configuration entries.
use std::fmt::Write as _;

use mctl_model::{ModelError, ProcessDescriptor};

use crate::{error::ExecError, security::is_watch_secure};

/// Restart when total memory stays above the limit for this many cycles.
const MEMORY_CYCLES: u32 = 10;
/// Restart when the port check fails for this many cycles.
const PORT_CYCLES: u32 = 3;
const DEFAULT_CHECK_HOST: &str = "127.0.0.1";

/// Render the supervisor entry for `descriptor`.
///
/// The descriptor is validated first; the watch name and group must also pass
/// [`is_watch_secure`], and quoted fields must not contain `"`.
pub fn render_config(descriptor: &ProcessDescriptor) -> Result<String, ExecError> {
    descriptor.validate()?;

    let watch = descriptor.full_name();
    for ident in [watch.as_str(), descriptor.group.as_str()] {
        if !is_watch_secure(ident) {
            return Err(ExecError::InsecureWatch(ident.to_string()));
        }
    }
    let quoted = [
        Some(descriptor.start_command.as_str()),
        Some(descriptor.stop_command.as_str()),
        descriptor.matching.as_deref(),
    ];
    if quoted.iter().flatten().any(|v| v.contains('"')) {
        return Err(ModelError::InvalidDescriptor("commands and match pattern cannot contain '\"'".into()).into());
    }

    let locator = match (&descriptor.pidfile, &descriptor.matching) {
        (Some(pidfile), _) => format!("with pidfile {}", pidfile.display()),
        (None, Some(pattern)) => format!("matching \"{pattern}\""),
        (None, None) => {
            return Err(ModelError::InvalidDescriptor("one of pidfile or matching is required".into()).into());
        }
    };

    let mut out = String::new();
    let _ = writeln!(out, "check process {watch} {locator}");
    let _ = writeln!(out, "  group {}", descriptor.group);

    if descriptor.env.is_empty() {
        let _ = writeln!(out, "  start program = \"{}\"", descriptor.start_command);
    } else {
        let _ = writeln!(
            out,
            "  start program = \"/usr/bin/env {} {}\"",
            descriptor.env.to_shell_prefix(),
            descriptor.start_command
        );
    }
    let _ = writeln!(out, "  stop program = \"{}\"", descriptor.stop_command);

    if let Some(mb) = descriptor.max_memory_mb {
        let _ = writeln!(out, "  if totalmem > {mb} MB for {MEMORY_CYCLES} cycles then restart");
    }
    if let (true, Some(port)) = (descriptor.check_port, descriptor.port) {
        let host = descriptor.check_host.as_deref().unwrap_or(DEFAULT_CHECK_HOST);
        let _ = writeln!(out, "  if failed host {host} port {port} for {PORT_CYCLES} cycles then restart");
    }
    for directive in &descriptor.extra_directives {
        let _ = writeln!(out, "  {}", directive.trim());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mctl_model::Env;

    fn app() -> ProcessDescriptor {
        let mut env = Env::new();
        env.push("APPLICATION_ID", "guestbook");
        env.push("PYTHONPATH", "/opt/app");
        ProcessDescriptor::new(
            "app___guestbook",
            "/opt/appserver/run --port 8080",
            "/bin/kill -TERM 4242",
            "/var/run/guestbook-8080.pid",
        )
        .with_port(8080)
        .with_group("app___guestbook")
        .with_env(env)
        .with_max_memory_mb(400)
        .with_port_check(None)
    }

    #[test]
    fn renders_full_entry() {
        let rendered = render_config(&app()).unwrap();
        let expected = "\
check process app___guestbook-8080 with pidfile /var/run/guestbook-8080.pid
  group app___guestbook
  start program = \"/usr/bin/env APPLICATION_ID='guestbook' PYTHONPATH='/opt/app' /opt/appserver/run --port 8080\"
  stop program = \"/bin/kill -TERM 4242\"
  if totalmem > 400 MB for 10 cycles then restart
  if failed host 127.0.0.1 port 8080 for 3 cycles then restart
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn renders_match_clause_without_env() {
        let mut d = ProcessDescriptor::new("taskqueue", "/usr/bin/tq", "/usr/bin/pkill -f tq", "/x.pid");
        d.pidfile = None;
        d.matching = Some("/usr/bin/tq".into());
        d.extra_directives = vec!["depends on datastore".into()];

        let rendered = render_config(&d).unwrap();
        assert!(rendered.starts_with("check process taskqueue matching \"/usr/bin/tq\"\n"));
        assert!(rendered.contains("  start program = \"/usr/bin/tq\"\n"));
        assert!(rendered.ends_with("  depends on datastore\n"));
        assert!(!rendered.contains("totalmem"));
    }

    #[test]
    fn rejects_unsafe_names_and_quotes() {
        let mut d = app();
        d.name = "app; reboot".into();
        assert!(matches!(render_config(&d), Err(ExecError::InsecureWatch(_))));

        let mut d = app();
        d.start_command = "/bin/sh -c \"echo\"".into();
        assert!(matches!(render_config(&d), Err(ExecError::InvalidDescriptor(_))));
    }

    #[test]
    fn multi_line_directive_cannot_add_a_check() {
        let mut d = app();
        d.extra_directives = vec!["if cpu > 90% for 5 cycles then alert\ncheck process rogue with pidfile /tmp/x".into()];
        assert!(matches!(render_config(&d), Err(ExecError::InvalidDescriptor(_))));
    }
}
