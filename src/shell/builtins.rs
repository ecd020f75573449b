//! The commands that run inside the shell itself instead of a forked child.

use std::process::exit;

use crate::jobs::{JobId, JobState, JobTable};
use crate::log::dev_warn;
use crate::system::interface::ProcessId;
use crate::system::killpg;
use crate::system::signal::consts::SIGCONT;

/// What the read-eval loop must do after a command was dispatched.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Outcome {
    /// The first word names no builtin; an external program must be launched.
    NotBuiltin,
    /// The command was handled in place.
    Handled,
    /// A job was moved into the foreground; the caller must wait on it.
    WaitForeground(ProcessId),
}

/// Execute `arguments` if its first word is a builtin. `arguments` must not
/// be empty.
pub(super) fn dispatch(jobs: &mut JobTable, arguments: &[String]) -> Outcome {
    match arguments[0].as_str() {
        "quit" => exit(0),
        "jobs" => {
            list_jobs(jobs);
            Outcome::Handled
        }
        cmd @ ("fg" | "bg") => run_bgfg(jobs, cmd, arguments.get(1)),
        _ => Outcome::NotBuiltin,
    }
}

fn list_jobs(jobs: &JobTable) {
    for job in jobs.iter() {
        println_ignore_io_error!(
            "[{}] ({}) {} {}",
            job.jid,
            job.pid,
            job.state,
            job.command_line
        );
    }
}

/// The `fg` and `bg` builtins. The target is either a bare process id or a
/// job id written as `%<n>`; bad targets are reported and leave the table
/// untouched.
fn run_bgfg(jobs: &mut JobTable, cmd: &str, argument: Option<&String>) -> Outcome {
    let Some(argument) = argument else {
        println_ignore_io_error!("{cmd} command requires PID or %jobid argument");
        return Outcome::Handled;
    };

    let job = if let Some(jid) = argument.strip_prefix('%') {
        let job = jid
            .parse()
            .ok()
            .map(JobId::new)
            .and_then(|jid| jobs.get_jid_mut(jid));

        let Some(job) = job else {
            println_ignore_io_error!("{argument}: No such job");
            return Outcome::Handled;
        };
        job
    } else if let Ok(pid) = argument.parse::<ProcessId>() {
        let Some(job) = jobs.get_pid_mut(pid) else {
            println_ignore_io_error!("({pid}): No such process");
            return Outcome::Handled;
        };
        job
    } else {
        println_ignore_io_error!("{cmd}: argument must be a PID or %jobid");
        return Outcome::Handled;
    };

    if cmd == "bg" {
        // re-sending the continue signal to a running job is harmless
        if let Err(err) = killpg(job.process_group(), SIGCONT) {
            dev_warn!("cannot continue job group {}: {err}", job.pid);
        }
        job.state = JobState::Background;
        println_ignore_io_error!("[{}] ({}) {}", job.jid, job.pid, job.command_line);
        Outcome::Handled
    } else {
        if job.state == JobState::Stopped {
            if let Err(err) = killpg(job.process_group(), SIGCONT) {
                dev_warn!("cannot continue job group {}: {err}", job.pid);
            }
        }
        job.state = JobState::Foreground;
        Outcome::WaitForeground(job.pid)
    }
}
