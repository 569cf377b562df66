//!
//! Hidden-window process launcher. The [Launcher] is core type which both
//! handles command line arguments and supervises the child process. Its main
//! argument is the command: the target executable followed by everything
//! forwarded to it.
//!
//! Resolution of the target is done by [Resolution] and is free of side
//! effects, starting the child goes through a [Spawner]. [launch] ties both
//! together and turns every outcome into one exit status.
//!
#![warn(missing_docs)]

use clap::{ArgAction, error::ErrorKind};
pub use clap::Parser;
use std::ffi::OsString;

mod cmdline;
pub mod error;
pub mod exit;
mod logging;
pub mod resolve;
pub mod spawn;

pub use error::{Error, Result, USAGE};
pub use exit::{ChildExit, FAILURE};
pub use resolve::{
    DEFAULT_FALLBACK_PROGRAM, NO_CONSOLE_FLAG, Program, Resolution,
    ResolvedCommand,
};
pub use spawn::{Spawner, Supervised, SystemSpawner};

/// Top-level arguments structure
///
/// Launcher options are only recognized before the executable. The
/// executable and every token after it end up in the trailing command.
#[derive(Parser, Debug)]
#[command(
    name = "SyncthingWindowsLauncher",
    version = "0.1",
    about = "Start a process with a hidden window and pass its exit code on",
    long_about = "Resolves the executable, starts it with a hidden window, \
                  waits for it to exit and exits with the same code. When the \
                  executable does not exist the fallback program is looked up \
                  through the system shell instead. Use `--` before an \
                  executable whose name starts with `-`.",
    override_usage = "SyncthingWindowsLauncher [OPTIONS] <executable> [arguments...]"
)]
pub struct Launcher {
    /// Fail when the executable does not exist instead of using the shell
    #[arg(long)]
    strict: bool,

    /// Program the shell looks up when the executable does not exist
    #[arg(long, value_name = "NAME", default_value = DEFAULT_FALLBACK_PROGRAM)]
    fallback_program: String,

    /// Print the resolved command as JSON instead of starting it
    #[arg(long)]
    print_command: bool,

    /// Increase diagnostic output on standard error (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Executable followed by the arguments forwarded to it
    ///
    /// Tokens are kept as given, including ones which are not valid Unicode.
    /// Put `--` first when the executable name starts with `-`.
    #[arg(
        value_name = "executable",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(OsString)
    )]
    command: Vec<OsString>,
}

impl Launcher {
    /// Resolution policy chosen by the options
    pub fn resolution(&self) -> Resolution {
        Resolution {
            strict: self.strict,
            fallback_program: self.fallback_program.clone(),
        }
    }

    /// Resolve, start through `spawner` and wait for the child
    pub fn run_with<S: Spawner>(&self, spawner: &mut S) -> Result<i32> {
        let (target, arguments) =
            self.command.split_first().ok_or(Error::Usage)?;

        let resolved = self.resolution().resolve(target, arguments)?;
        tracing::debug!(?resolved, "resolved command");

        if self.print_command {
            println!("{}", serde_json::to_string_pretty(&resolved)?);
            return Ok(0);
        }

        let mut child = spawner.spawn(&resolved)?;
        tracing::info!(pid = child.id(), "started child process");

        let exit = child.wait()?;
        match exit {
            ChildExit::Signal(_) => tracing::warn!("child terminated by {exit}"),
            ChildExit::Code(_) => tracing::info!("child finished with {exit}"),
        }

        Ok(exit.status())
    }
}

/// Entire launcher execution for `invocation`, program name included
///
/// Returns the status to exit with: the child's own code, or [FAILURE] after
/// the reason was written to standard error.
pub fn launch<I, T, S>(invocation: I, spawner: &mut S) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    S: Spawner,
{
    let launcher = match Launcher::try_parse_from(invocation) {
        Ok(launcher) => launcher,
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            let _ = err.print();
            return 0;
        }
        Err(_) => return report(Error::Usage),
    };

    logging::init(launcher.verbose);
    launcher.run_with(spawner).unwrap_or_else(report)
}

fn report(err: Error) -> i32 {
    eprintln!("{err}");
    if let Some(source) = std::error::Error::source(&err) {
        eprintln!("Error: {source}");
    }
    FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, io, path::PathBuf};
    use tempfile::{TempDir, tempdir};

    struct FakeChild(ChildExit);

    impl Supervised for FakeChild {
        fn id(&self) -> u32 {
            4242
        }

        fn wait(&mut self) -> io::Result<ChildExit> {
            Ok(self.0)
        }
    }

    #[derive(Default)]
    struct FakeSpawner {
        spawned: Vec<ResolvedCommand>,
        exit: Option<ChildExit>,
        refuse: bool,
    }

    impl FakeSpawner {
        fn exiting_with(code: i32) -> Self {
            Self {
                exit: Some(ChildExit::Code(code)),
                ..Self::default()
            }
        }
    }

    impl Spawner for FakeSpawner {
        type Child = FakeChild;

        fn spawn(&mut self, command: &ResolvedCommand) -> Result<FakeChild> {
            self.spawned.push(command.clone());
            if self.refuse {
                return Err(Error::Spawn(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "permission denied",
                )));
            }
            Ok(FakeChild(self.exit.unwrap_or(ChildExit::Code(0))))
        }
    }

    fn target() -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("app.exe");
        fs::write(&exe, "").unwrap();
        (dir, exe)
    }

    #[test]
    fn usage_gate_spawns_nothing() {
        let mut spawner = FakeSpawner::exiting_with(0);
        assert_eq!(launch(["launcher"], &mut spawner), FAILURE);
        assert_eq!(launch(["launcher", "-v"], &mut spawner), FAILURE);
        assert_eq!(launch(["launcher", "--strict"], &mut spawner), FAILURE);
        assert!(spawner.spawned.is_empty());
    }

    #[test]
    fn exit_code_is_propagated_exactly() {
        let (_dir, exe) = target();
        for code in [0, 1, 42, 255] {
            let mut spawner = FakeSpawner::exiting_with(code);
            let status = launch(
                ["launcher", exe.to_str().unwrap()],
                &mut spawner,
            );
            assert_eq!(status, code);
            assert_eq!(spawner.spawned.len(), 1);
        }
    }

    #[test]
    fn existing_target_runs_from_its_directory() {
        let (dir, exe) = target();
        let mut spawner = FakeSpawner::exiting_with(7);

        let status = launch(
            ["launcher", exe.to_str().unwrap(), "--flag", "value"],
            &mut spawner,
        );

        assert_eq!(status, 7);
        let spawned = &spawner.spawned[0];
        assert_eq!(spawned.program, Program::Direct { path: exe.clone() });
        assert_eq!(spawned.arguments, ["--flag", "value"]);
        assert_eq!(spawned.working_directory.as_deref(), Some(dir.path()));
        assert!(spawned.hide_window);
        assert!(!spawned.no_console);
    }

    #[test]
    fn tokens_after_target_are_forwarded_even_when_they_look_like_options() {
        let (_dir, exe) = target();
        let mut spawner = FakeSpawner::default();

        launch(
            [
                "launcher",
                exe.to_str().unwrap(),
                "--verbose",
                "-v",
                "--strict",
                "--help",
                "--no-console",
            ],
            &mut spawner,
        );

        let spawned = &spawner.spawned[0];
        assert_eq!(
            spawned.arguments,
            ["--verbose", "-v", "--strict", "--help", "--no-console"]
        );
        assert!(spawned.no_console);
    }

    #[test]
    fn missing_target_falls_back_to_shell() {
        let mut spawner = FakeSpawner::exiting_with(3);

        let status = launch(
            ["launcher", "no-such-target", "serve", "--no-console"],
            &mut spawner,
        );

        assert_eq!(status, 3);
        let spawned = &spawner.spawned[0];
        assert_eq!(
            spawned.program,
            Program::Shell {
                name: DEFAULT_FALLBACK_PROGRAM.into()
            }
        );
        assert_eq!(spawned.arguments, ["serve", "--no-console"]);
        assert_eq!(spawned.working_directory, None);
        assert!(spawned.no_console);
    }

    #[test]
    fn fallback_program_option_changes_shell_lookup() {
        let mut spawner = FakeSpawner::default();
        launch(
            ["launcher", "--fallback-program", "syncthing-rc", "no-such-target"],
            &mut spawner,
        );
        assert_eq!(
            spawner.spawned[0].program,
            Program::Shell {
                name: "syncthing-rc".into()
            }
        );
    }

    #[test]
    fn strict_missing_target_fails_without_spawning() {
        let mut spawner = FakeSpawner::default();
        let status =
            launch(["launcher", "--strict", "no-such-target"], &mut spawner);
        assert_eq!(status, FAILURE);
        assert!(spawner.spawned.is_empty());
    }

    #[test]
    fn spawn_refusal_fails() {
        let (_dir, exe) = target();
        let mut spawner = FakeSpawner {
            refuse: true,
            ..FakeSpawner::default()
        };
        let status = launch(["launcher", exe.to_str().unwrap()], &mut spawner);
        assert_eq!(status, FAILURE);
    }

    #[test]
    fn signal_termination_maps_to_shell_status() {
        let (_dir, exe) = target();
        let mut spawner = FakeSpawner {
            exit: Some(ChildExit::Signal(9)),
            ..FakeSpawner::default()
        };
        let status = launch(["launcher", exe.to_str().unwrap()], &mut spawner);
        assert_eq!(status, 137);
    }

    #[test]
    fn print_command_spawns_nothing() {
        let (_dir, exe) = target();
        let mut spawner = FakeSpawner::exiting_with(9);
        let status = launch(
            ["launcher", "--print-command", exe.to_str().unwrap(), "a"],
            &mut spawner,
        );
        assert_eq!(status, 0);
        assert!(spawner.spawned.is_empty());
    }

    #[test]
    fn resolution_follows_options() {
        let launcher = Launcher::try_parse_from([
            "launcher",
            "--strict",
            "--fallback-program",
            "st",
            "app",
        ])
        .unwrap();
        assert_eq!(
            launcher.resolution(),
            Resolution {
                strict: true,
                fallback_program: "st".into()
            }
        );
        assert_eq!(launcher.command, ["app"]);
    }

    #[test]
    fn double_dash_allows_target_starting_with_dash() {
        let mut spawner = FakeSpawner::exiting_with(5);
        let status = launch(["launcher", "--", "-v", "x"], &mut spawner);

        assert_eq!(status, 5);
        let spawned = &spawner.spawned[0];
        assert!(matches!(spawned.program, Program::Shell { .. }));
        assert_eq!(spawned.arguments, ["x"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_arguments_reach_the_child() {
        use std::os::unix::ffi::OsStringExt;

        let (_dir, exe) = target();
        let odd = OsString::from_vec(b"caf\xe9".to_vec());
        let mut spawner = FakeSpawner::default();

        let status = launch(
            [
                OsString::from("launcher"),
                exe.into_os_string(),
                odd.clone(),
                OsString::from("-v"),
            ],
            &mut spawner,
        );

        assert_eq!(status, 0);
        assert_eq!(spawner.spawned[0].arguments, [odd, OsString::from("-v")]);
    }
}
