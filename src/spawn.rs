//! Child process creation.
//!
//! [Spawner] is the seam between the launcher logic and the operating system:
//! [SystemSpawner] starts real processes, tests substitute their own.

use std::io;

use crate::{error::Result, exit::ChildExit, resolve::ResolvedCommand};

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod win32;

#[cfg(unix)]
use unix as platform;
#[cfg(windows)]
use win32 as platform;

#[cfg(unix)]
pub use unix::{SHELL, build_command};
#[cfg(windows)]
pub use win32::{Process, command_line, creation_flags, startup_info};

/// A started child the launcher owns until it exits
pub trait Supervised {
    /// OS process identifier
    fn id(&self) -> u32;

    /// Block until the child terminates
    fn wait(&mut self) -> io::Result<ChildExit>;
}

/// Starts a [ResolvedCommand]
pub trait Spawner {
    /// Handle of the started child
    type Child: Supervised;

    /// Start the child. OS refusal is reported as
    /// [Error::Spawn](crate::Error::Spawn).
    fn spawn(&mut self, command: &ResolvedCommand) -> Result<Self::Child>;
}

/// [Spawner] creating real OS processes with inherited standard streams
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl Spawner for SystemSpawner {
    type Child = platform::Process;

    fn spawn(&mut self, command: &ResolvedCommand) -> Result<platform::Process> {
        platform::spawn(command)
    }
}
