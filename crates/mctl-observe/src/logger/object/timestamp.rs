use std::fmt;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

use super::LoggerTimeZone;

/// RFC3339 timestamps in the configured timezone.
///
/// The local offset is read on every event, so a refreshed offset shows up
/// without reinstalling the subscriber.
#[derive(Debug, Clone, Copy)]
pub struct LoggerTimestamp {
    tz: LoggerTimeZone,
}

impl LoggerTimestamp {
    pub fn new(tz: LoggerTimeZone) -> Self {
        Self { tz }
    }

    fn render(&self, at: OffsetDateTime) -> String {
        at.to_offset(self.tz.offset())
            .format(&Rfc3339)
            .unwrap_or_else(|_| "<invalid-time>".to_string())
    }
}

impl FormatTime for LoggerTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{} ", self.render(OffsetDateTime::now_utc()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_timestamps_end_with_z() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(LoggerTimestamp::new(LoggerTimeZone::Utc).render(at), "2023-11-14T22:13:20Z");
    }
}
