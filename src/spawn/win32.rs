use std::{ffi::OsStr, io, mem, os::windows::ffi::OsStrExt};

use ::windows::{
    Win32::{
        Foundation::{CloseHandle, HANDLE, WAIT_FAILED},
        System::{
            Console::{
                GetStdHandle, STD_ERROR_HANDLE, STD_INPUT_HANDLE,
                STD_OUTPUT_HANDLE,
            },
            Threading::{
                CREATE_NO_WINDOW, CreateProcessW, GetExitCodeProcess, INFINITE,
                PROCESS_CREATION_FLAGS, PROCESS_INFORMATION,
                STARTF_USESHOWWINDOW, STARTF_USESTDHANDLES, STARTUPINFOW,
                WaitForSingleObject,
            },
        },
        UI::WindowsAndMessaging::SW_HIDE,
    },
    core::{PCWSTR, PWSTR},
};

use super::Supervised;
use crate::{
    cmdline,
    error::{Error, Result},
    exit::ChildExit,
    resolve::{Program, ResolvedCommand},
};

/// Owned process handle, closed on drop
#[derive(Debug)]
pub struct Process {
    handle: HANDLE,
    id: u32,
}

impl Drop for Process {
    fn drop(&mut self) {
        // SAFETY: the handle came from CreateProcessW and is closed only here.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

impl Supervised for Process {
    fn id(&self) -> u32 {
        self.id
    }

    fn wait(&mut self) -> io::Result<ChildExit> {
        let mut code = 0u32;
        // SAFETY: the handle stays open for the lifetime of self.
        unsafe {
            if WaitForSingleObject(self.handle, INFINITE) == WAIT_FAILED {
                return Err(io::Error::last_os_error());
            }
            GetExitCodeProcess(self.handle, &mut code)?;
        }
        Ok(ChildExit::Code(code as i32))
    }
}

fn wide(s: &OsStr) -> Vec<u16> {
    s.encode_wide().collect()
}

fn nul_terminated(mut buffer: Vec<u16>) -> Vec<u16> {
    buffer.push(0);
    buffer
}

fn as_pcwstr(buffer: Option<&Vec<u16>>) -> PCWSTR {
    buffer.map_or(PCWSTR::null(), |buffer| PCWSTR(buffer.as_ptr()))
}

/// Command line handed to `CreateProcessW`, without the trailing NUL
pub fn command_line(resolved: &ResolvedCommand) -> Vec<u16> {
    let arguments: Vec<Vec<u16>> =
        resolved.arguments.iter().map(|arg| wide(arg)).collect();
    let arguments = arguments.iter().map(Vec::as_slice);

    match resolved.program {
        Program::Direct { ref path } => {
            cmdline::direct(&wide(path.as_os_str()), arguments)
        }
        Program::Shell { ref name } => {
            cmdline::shell(&wide(OsStr::new(name)), arguments)
        }
    }
}

/// Process creation flags: no console allocation with `--no-console`
pub fn creation_flags(resolved: &ResolvedCommand) -> PROCESS_CREATION_FLAGS {
    if resolved.no_console {
        CREATE_NO_WINDOW
    } else {
        PROCESS_CREATION_FLAGS::default()
    }
}

/// Startup information: hidden window, launcher's standard handles
pub fn startup_info(resolved: &ResolvedCommand) -> STARTUPINFOW {
    let mut info = STARTUPINFOW {
        cb: mem::size_of::<STARTUPINFOW>() as u32,
        dwFlags: STARTF_USESTDHANDLES,
        ..Default::default()
    };
    if resolved.hide_window {
        info.dwFlags = info.dwFlags | STARTF_USESHOWWINDOW;
        info.wShowWindow = SW_HIDE.0 as u16;
    }

    // SAFETY: GetStdHandle only reads the process parameters.
    unsafe {
        info.hStdInput = GetStdHandle(STD_INPUT_HANDLE).unwrap_or_default();
        info.hStdOutput = GetStdHandle(STD_OUTPUT_HANDLE).unwrap_or_default();
        info.hStdError = GetStdHandle(STD_ERROR_HANDLE).unwrap_or_default();
    }
    info
}

pub fn spawn(resolved: &ResolvedCommand) -> Result<Process> {
    let line = command_line(resolved);
    if line.contains(&0) {
        return Err(Error::from(String::from(
            "cannot pass a NUL character on the command line",
        )));
    }
    let mut line = nul_terminated(line);

    let application = match resolved.program {
        Program::Direct { ref path } => {
            Some(nul_terminated(wide(path.as_os_str())))
        }
        Program::Shell { .. } => None,
    };
    let directory = resolved
        .working_directory
        .as_ref()
        .map(|dir| nul_terminated(wide(dir.as_os_str())));

    let info = startup_info(resolved);
    let mut process = PROCESS_INFORMATION::default();

    // SAFETY: every string pointer refers to a NUL-terminated buffer which
    // outlives the call, the command line buffer is writable.
    unsafe {
        CreateProcessW(
            as_pcwstr(application.as_ref()),
            Some(PWSTR(line.as_mut_ptr())),
            None,
            None,
            true,
            creation_flags(resolved),
            None,
            as_pcwstr(directory.as_ref()),
            &info,
            &mut process,
        )
        .map_err(|e| Error::Spawn(e.into()))?;
        let _ = CloseHandle(process.hThread);
    }

    Ok(Process {
        handle: process.hProcess,
        id: process.dwProcessId,
    })
}
