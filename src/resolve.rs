//! Target resolution.
//!
//! [Resolution::resolve] turns the target token and the tokens after it into a
//! [ResolvedCommand] without touching any process. The only outside state it
//! reads is the filesystem: does the target exist as a file.

use serde::{Serialize, Serializer};
use std::{
    ffi::{OsStr, OsString},
    path::{self, Path, PathBuf},
};

use crate::error::{Error, Result};

/// Argument which additionally asks for the child to get no console at all.
pub const NO_CONSOLE_FLAG: &str = "--no-console";

/// Program handed to the shell when the target does not exist.
pub const DEFAULT_FALLBACK_PROGRAM: &str = "syncthing";

/// What gets started
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Program {
    /// Absolute path of an existing file, started directly
    Direct {
        /// Absolute path to the executable
        path: PathBuf,
    },
    /// Bare program name looked up through the platform shell's search path
    Shell {
        /// Name the shell searches for
        name: String,
    },
}

/// Fully decided child process specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCommand {
    /// Program to start
    pub program: Program,
    /// Arguments in the order they were supplied, target excluded
    #[serde(serialize_with = "lossy_strings")]
    pub arguments: Vec<OsString>,
    /// Directory the child starts in, `None` to inherit the launcher's
    pub working_directory: Option<PathBuf>,
    /// Always set: the child window is requested hidden
    pub hide_window: bool,
    /// Set when [NO_CONSOLE_FLAG] is among the arguments
    pub no_console: bool,
}

/// Resolution policy for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Fail with [Error::NotFound] instead of falling back to the shell
    pub strict: bool,
    /// Program name the shell looks up on fallback
    pub fallback_program: String,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            strict: false,
            fallback_program: DEFAULT_FALLBACK_PROGRAM.into(),
        }
    }
}

impl Resolution {
    /// Decide what to start for `target` with `arguments` forwarded.
    ///
    /// An existing file is started directly from its own directory. Anything
    /// else either fails (strict) or becomes a shell lookup of
    /// [fallback_program](Self::fallback_program) which inherits the current
    /// directory.
    pub fn resolve(
        &self,
        target: &OsStr,
        arguments: &[OsString],
    ) -> Result<ResolvedCommand> {
        let target = PathBuf::from(target);
        let candidate = path::absolute(&target).unwrap_or(target);

        let (program, working_directory) = if candidate.is_file() {
            let working_directory =
                candidate.parent().map(Path::to_path_buf);
            (Program::Direct { path: candidate }, working_directory)
        } else if self.strict {
            return Err(Error::NotFound(candidate));
        } else {
            let name = self.fallback_program.clone();
            (Program::Shell { name }, None)
        };

        Ok(ResolvedCommand {
            program,
            arguments: arguments.to_vec(),
            working_directory,
            hide_window: true,
            no_console: arguments.iter().any(|arg| arg == NO_CONSOLE_FLAG),
        })
    }
}

fn lossy_strings<S: Serializer>(
    arguments: &[OsString],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(arguments.iter().map(|arg| arg.to_string_lossy()))
}
