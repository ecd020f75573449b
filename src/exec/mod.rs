//! Spawning external commands as process group leaders.

use std::fs::File;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::system::interface::ProcessId;
use crate::system::signal::SignalSet;
use crate::system::{fork, setpgid, ForkResult, _exit};

/// Everything needed to start one external command.
pub(crate) struct SpawnRequest<'a> {
    pub(crate) program: &'a str,
    /// The arguments passed to the program, not including the program name.
    pub(crate) arguments: &'a [String],
    pub(crate) stdin: Option<&'a Path>,
    pub(crate) stdout: Option<&'a Path>,
}

/// Fork and execute the requested command in a fresh process group.
///
/// Must be called with the job control signals blocked; the child resets its
/// own mask before executing so the command starts with signals deliverable.
/// The parent returns as soon as the child process id is known, which is
/// before the child has executed anything.
///
/// Redirection targets are opened before forking so that a missing input file
/// aborts the launch instead of leaving a child behind.
pub(crate) fn spawn_job(request: SpawnRequest) -> io::Result<ProcessId> {
    let mut command = Command::new(request.program);
    command.args(request.arguments);

    if let Some(path) = request.stdin {
        command.stdin(Stdio::from(File::open(path)?));
    }
    if let Some(path) = request.stdout {
        command.stdout(Stdio::from(File::create(path)?));
    }

    let ForkResult::Parent(child_pid) = fork()? else {
        run_child(command, request.program)
    };

    Ok(child_pid)
}

fn run_child(mut command: Command, program: &str) -> ! {
    let own_pid = ProcessId::new(0);
    if let Err(err) = setpgid(own_pid, own_pid) {
        eprintln_ignore_io_error!("jsh: cannot create process group: {err}");
        _exit(1);
    }

    // undo the launch-time mask inherited over fork
    let unblocked = SignalSet::job_control().and_then(|set| set.unblock());
    if let Err(err) = unblocked {
        eprintln_ignore_io_error!("jsh: cannot restore signal mask: {err}");
        _exit(1);
    }

    // only returns on failure; resolves bare program names against PATH
    let _ = command.exec();

    println_ignore_io_error!("{program}: Command not found");
    _exit(1);
}
