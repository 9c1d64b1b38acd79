//! Well-known locations of the supervisor's control surfaces.

/// Base URL of the supervisor's HTTP control API.
pub const DEFAULT_MONIT_ENDPOINT: &str = "http://localhost:2812";

/// Path of the supervisor's command-line control binary.
pub const DEFAULT_MONIT_BIN: &str = "/usr/bin/monit";

/// Group assigned to descriptors that do not name one.
pub const DEFAULT_GROUP: &str = "mctl";
