use std::{
    path::Path,
    process::{Command, Stdio},
};

use tracing::trace;

/// Seam over blocking subprocess execution.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion.
    ///
    /// Returns the exit code, or `None` when the process was terminated by a signal.
    fn status(&self, program: &Path, args: &[&str]) -> std::io::Result<Option<i32>>;
}

/// [`CommandRunner`] spawning real OS processes and waiting on them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn status(&self, program: &Path, args: &[&str]) -> std::io::Result<Option<i32>> {
        trace!(program = %program.display(), ?args, "spawning");
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()?;
        Ok(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_exit_codes() {
        assert_eq!(SystemRunner.status(Path::new("true"), &[]).unwrap(), Some(0));
        assert_eq!(SystemRunner.status(Path::new("false"), &[]).unwrap(), Some(1));
    }

    #[test]
    fn missing_binary_is_an_io_error() {
        let err = SystemRunner
            .status(Path::new("/nonexistent/monit"), &["reload"])
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
