//! Mapping of child outcomes to the launcher's own exit status.

use std::{fmt, process};

/// Status the launcher exits with on any failure of its own.
pub const FAILURE: i32 = -1;

/// Offset added to a terminating signal number, as shells do.
pub const SIGNAL_BASE: i32 = 128;

/// How the child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// Child exited and reported this code
    Code(i32),
    /// Child was terminated by this signal number
    Signal(i32),
}

impl ChildExit {
    /// Status the launcher itself exits with
    pub fn status(self) -> i32 {
        match self {
            ChildExit::Code(code) => code,
            ChildExit::Signal(signal) => SIGNAL_BASE + signal,
        }
    }
}

impl From<process::ExitStatus> for ChildExit {
    fn from(status: process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ChildExit::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ChildExit::Signal(signal);
            }
        }
        ChildExit::Code(FAILURE)
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ChildExit::Code(code) => write!(f, "exit code {code}"),
            ChildExit::Signal(signal) => {
                write!(f, "signal {signal}")?;
                #[cfg(unix)]
                {
                    use nix::sys::signal::Signal;
                    if let Ok(signal) = Signal::try_from(signal) {
                        write!(f, " ({})", signal.as_str())?;
                    }
                }
                Ok(())
            }
        }
    }
}
