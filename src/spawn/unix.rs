use std::{
    ffi::OsString,
    io, iter,
    os::unix::ffi::{OsStrExt, OsStringExt},
    process::{Child, Command},
};

use super::Supervised;
use crate::{
    error::{Error, Result},
    exit::ChildExit,
    resolve::{Program, ResolvedCommand},
};

/// Shell which performs the search-path lookup on fallback
pub const SHELL: &str = "/bin/sh";

pub type Process = Child;

impl Supervised for Child {
    fn id(&self) -> u32 {
        Child::id(self)
    }

    fn wait(&mut self) -> io::Result<ChildExit> {
        Child::wait(self).map(ChildExit::from)
    }
}

pub fn spawn(resolved: &ResolvedCommand) -> Result<Child> {
    build_command(resolved)?.spawn().map_err(Error::Spawn)
}

/// Translate a [ResolvedCommand] into a [Command] ready to spawn
///
/// Arguments stay discrete until here. Only the shell fallback needs a single
/// command line, which is quoted word by word.
pub fn build_command(resolved: &ResolvedCommand) -> Result<Command> {
    let mut command = match resolved.program {
        Program::Direct { ref path } => {
            let mut command = Command::new(path);
            command.args(&resolved.arguments);
            command
        }
        Program::Shell { ref name } => shell_command(name, &resolved.arguments)?,
    };

    if let Some(dir) = resolved.working_directory.as_ref() {
        command.current_dir(dir);
    }
    // No window exists here, only the console part applies.
    command.console_mode(resolved.no_console);

    Ok(command)
}

fn shell_command(name: &str, arguments: &[OsString]) -> Result<Command> {
    let words = iter::once(name.as_bytes())
        .chain(arguments.iter().map(|arg| arg.as_bytes()));
    let line = shlex::bytes::try_join(words)
        .map_err(|e| format!("cannot quote command line: {e}"))?;

    let mut command = Command::new(SHELL);
    command.arg("-c").arg(OsString::from_vec(line));
    Ok(command)
}

/// Console suppression for a child [Command]
trait ConsoleModeExt {
    /// Start the child without a controlling terminal when `no_console`
    fn console_mode(&mut self, no_console: bool) -> &mut Self;
}

impl ConsoleModeExt for Command {
    fn console_mode(&mut self, no_console: bool) -> &mut Self {
        use std::os::unix::process::CommandExt;

        if no_console {
            // SAFETY: setsid is async-signal-safe and touches no shared state.
            unsafe {
                self.pre_exec(|| {
                    nix::unistd::setsid().map(drop).map_err(io::Error::from)
                });
            }
        }
        self
    }
}
