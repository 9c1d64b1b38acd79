use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_GROUP, Env,
    error::{ModelError, ModelResult},
};

/// Declarative description of a long-running process managed by the supervisor.
///
/// A descriptor is everything needed to render the supervisor configuration
/// file for one watch:
/// - identity (`name`, optional `port` suffix, `group`)
/// - lifecycle commands (`start_command`, `stop_command`, `env`)
/// - how the supervisor finds the process (`pidfile` or `matching`)
/// - optional health directives (`max_memory_mb`, `check_port`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDescriptor {
    /// Base watch name, e.g. `app___guestbook`.
    pub name: String,
    /// Instance port. When set, the full watch name becomes `<name>-<port>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Command line used by the supervisor to launch the process.
    pub start_command: String,
    /// Command line used by the supervisor to stop the process.
    pub stop_command: String,
    /// Pidfile written by the process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pidfile: Option<PathBuf>,
    /// Process-table pattern used when the process writes no pidfile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching: Option<String>,
    /// Supervisor group shared by related watches.
    #[serde(default = "default_group")]
    pub group: String,
    /// Environment prepended to the start command.
    #[serde(default, skip_serializing_if = "Env::is_empty")]
    pub env: Env,
    /// Restart the process once its total memory exceeds this many megabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_memory_mb: Option<u64>,
    /// Restart the process when `port` stops accepting connections.
    #[serde(default)]
    pub check_port: bool,
    /// Host used by the port check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_host: Option<String>,
    /// Raw directives appended verbatim to the rendered entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_directives: Vec<String>,
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

impl ProcessDescriptor {
    /// Create a descriptor located by pidfile, with default group and no health checks.
    pub fn new(
        name: impl Into<String>,
        start_command: impl Into<String>,
        stop_command: impl Into<String>,
        pidfile: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            port: None,
            start_command: start_command.into(),
            stop_command: stop_command.into(),
            pidfile: Some(pidfile.into()),
            matching: None,
            group: default_group(),
            env: Env::new(),
            max_memory_mb: None,
            check_port: false,
            check_host: None,
            extra_directives: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    pub fn with_max_memory_mb(mut self, mb: u64) -> Self {
        self.max_memory_mb = Some(mb);
        self
    }

    /// Enable the port health check against `host` (`127.0.0.1` when `None`).
    pub fn with_port_check(mut self, host: Option<String>) -> Self {
        self.check_port = true;
        self.check_host = host;
        self
    }

    /// Watch name as registered with the supervisor.
    pub fn full_name(&self) -> String {
        match self.port {
            Some(port) => format!("{}-{}", self.name, port),
            None => self.name.clone(),
        }
    }

    /// Structural validation.
    ///
    /// Rules:
    /// - `name`, `group`, `start_command`, `stop_command` are not blank;
    /// - exactly one of `pidfile` / `matching` is set;
    /// - `check_port` requires `port`;
    /// - `max_memory_mb`, when set, is non-zero;
    /// - rendered fields hold no line breaks.
    pub fn validate(&self) -> ModelResult<()> {
        let blank = [
            ("name", &self.name),
            ("group", &self.group),
            ("startCommand", &self.start_command),
            ("stopCommand", &self.stop_command),
        ];
        if let Some((field, _)) = blank.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ModelError::InvalidDescriptor(format!("{field} is empty")));
        }
        match (&self.pidfile, &self.matching) {
            (Some(_), Some(_)) => {
                return Err(ModelError::InvalidDescriptor(
                    "pidfile and matching are mutually exclusive".into(),
                ));
            }
            (None, None) => {
                return Err(ModelError::InvalidDescriptor(
                    "one of pidfile or matching is required".into(),
                ));
            }
            _ => {}
        }
        if self.check_port && self.port.is_none() {
            return Err(ModelError::InvalidDescriptor(
                "checkPort requires a port".into(),
            ));
        }
        if self.max_memory_mb == Some(0) {
            return Err(ModelError::InvalidDescriptor(
                "maxMemoryMb cannot be zero".into(),
            ));
        }

        let pidfile = self.pidfile.as_ref().map(|p| p.to_string_lossy());
        let single_line = [
            ("startCommand", Some(self.start_command.as_str())),
            ("stopCommand", Some(self.stop_command.as_str())),
            ("matching", self.matching.as_deref()),
            ("checkHost", self.check_host.as_deref()),
            ("pidfile", pidfile.as_deref()),
        ]
        .into_iter()
        .chain(self.extra_directives.iter().map(|d| ("extraDirectives", Some(d.as_str()))));
        for (field, value) in single_line {
            if value.is_some_and(|v| v.contains(['\n', '\r'])) {
                return Err(ModelError::InvalidDescriptor(format!("{field} spans multiple lines")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> ProcessDescriptor {
        ProcessDescriptor::new(
            "app___guestbook",
            "/opt/appserver/run --port 8080",
            "/bin/kill -TERM $(cat /var/run/guestbook-8080.pid)",
            "/var/run/guestbook-8080.pid",
        )
    }

    #[test]
    fn full_name_appends_port() {
        assert_eq!(app().full_name(), "app___guestbook");
        assert_eq!(app().with_port(8080).full_name(), "app___guestbook-8080");
    }

    #[test]
    fn valid_descriptor_passes() {
        let d = app()
            .with_port(8080)
            .with_max_memory_mb(400)
            .with_port_check(None);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn rejects_blank_commands() {
        let mut d = app();
        d.start_command = "  ".into();
        assert!(matches!(d.validate(), Err(ModelError::InvalidDescriptor(m)) if m.contains("startCommand")));
    }

    #[test]
    fn requires_exactly_one_locator() {
        let mut d = app();
        d.matching = Some("guestbook".into());
        assert!(d.validate().is_err());

        d.pidfile = None;
        assert!(d.validate().is_ok());

        d.matching = None;
        assert!(d.validate().is_err());
    }

    #[test]
    fn port_check_requires_port() {
        let d = app().with_port_check(Some("127.0.0.1".into()));
        assert!(d.validate().is_err());
    }

    #[test]
    fn zero_memory_limit_is_invalid() {
        let d = app().with_max_memory_mb(0);
        assert!(d.validate().is_err());
    }

    #[test]
    fn line_breaks_are_rejected() {
        let mut d = app();
        d.extra_directives = vec!["if cpu > 90% for 5 cycles then alert\ncheck process rogue matching \"x\"".into()];
        assert!(matches!(d.validate(), Err(ModelError::InvalidDescriptor(m)) if m.contains("extraDirectives")));

        let mut d = app();
        d.stop_command = "/bin/true\r".into();
        assert!(d.validate().is_err());

        let mut d = app();
        d.extra_directives = vec!["if cpu > 90% for 5 cycles then alert".into()];
        assert!(d.validate().is_ok());
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "name": "datastore",
            "startCommand": "/usr/bin/datastore",
            "stopCommand": "/usr/bin/pkill -f datastore",
            "matching": "datastore"
        }"#;
        let d: ProcessDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.group, DEFAULT_GROUP);
        assert!(d.env.is_empty());
        assert!(!d.check_port);
        assert!(d.validate().is_ok());
    }
}
