mod error;
pub use error::ExecError;

mod security;
pub use security::is_watch_secure;

mod runner;
pub use runner::{CommandRunner, SystemRunner};

mod cli;
pub use cli::{CliConfig, MonitCli};

mod render;
pub use render::render_config;

mod writer;
pub use writer::ConfigWriter;
