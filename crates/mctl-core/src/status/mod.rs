//! Parsing of the supervisor's XML status document (`GET /_status?format=xml`).
//!
//! Only the `<service>` children of the root element are read; for each one
//! the `name`, `monitor` and `status` elements are mapped through
//! [`mctl_model::derive_state`]. Every other element is ignored.
use serde::Deserialize;

use mctl_model::{ProcessEntry, derive_state};

use crate::error::OperatorError;

#[derive(Debug, Deserialize)]
struct StatusDocument {
    #[serde(rename = "service", default)]
    services: Vec<ServiceElement>,
}

#[derive(Debug, Deserialize)]
struct ServiceElement {
    name: String,
    monitor: i64,
    status: i64,
}

/// Extract every watch and its derived state from a status document.
pub fn parse_entries(document: &str) -> Result<Vec<ProcessEntry>, OperatorError> {
    let doc: StatusDocument = quick_xml::de::from_str(document)
        .map_err(|e| OperatorError::MalformedStatus(e.to_string()))?;

    Ok(doc
        .services
        .into_iter()
        .map(|s| ProcessEntry::new(s.name.trim(), derive_state(s.monitor, s.status)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mctl_model::ProcessState;

    const STATUS: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<monit>
  <server>
    <id>4e6ab3d1c2</id>
    <uptime>1024</uptime>
    <localhostname>node-1</localhostname>
  </server>
  <platform><name>Linux</name><cpu>4</cpu></platform>
  <service type="3">
    <name>app___guestbook-8080</name>
    <collected_sec>1700000000</collected_sec>
    <status>0</status>
    <status_hint>0</status_hint>
    <monitor>1</monitor>
    <monitormode>0</monitormode>
    <pendingaction>0</pendingaction>
    <pid>4242</pid>
  </service>
  <service type="3">
    <name>datastore</name>
    <status>512</status>
    <status_hint>0</status_hint>
    <monitor>1</monitor>
    <monitormode>0</monitormode>
  </service>
  <service type="3">
    <name>taskqueue-17446</name>
    <status>0</status>
    <monitor>0</monitor>
  </service>
  <service type="3">
    <name>blobstore</name>
    <status>0</status>
    <monitor>2</monitor>
  </service>
</monit>"#;

    #[test]
    fn parses_every_service() {
        let entries = parse_entries(STATUS).unwrap();
        let states: Vec<_> = entries
            .iter()
            .map(|e| (e.name.as_str(), e.state))
            .collect();

        assert_eq!(
            states,
            vec![
                ("app___guestbook-8080", ProcessState::Running),
                ("datastore", ProcessState::Stopped),
                ("taskqueue-17446", ProcessState::Unmonitored),
                ("blobstore", ProcessState::Pending),
            ]
        );
    }

    #[test]
    fn document_without_services_is_empty() {
        let entries = parse_entries("<monit><server><uptime>1</uptime></server></monit>").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn mismatched_tags_are_malformed() {
        let err = parse_entries("<monit><service></monit>").unwrap_err();
        assert!(matches!(err, OperatorError::MalformedStatus(_)));
    }

    #[test]
    fn service_without_monitor_is_malformed() {
        let err = parse_entries("<monit><service><name>x</name><status>0</status></service></monit>")
            .unwrap_err();
        assert!(matches!(err, OperatorError::MalformedStatus(_)));
    }
}
