//! Turning delivered signals into job table updates.
//!
//! The signal handlers themselves only copy the raw signal information into
//! the [`crate::system::signal::SignalStream`]; everything here runs in the
//! main flow of control, which is the sole owner of the job table.

use std::process::exit;

use crate::cutils::was_interrupted;
use crate::jobs::{JobState, JobTable};
use crate::log::{dev_info, dev_warn};
use crate::system::interface::ProcessId;
use crate::system::killpg;
use crate::system::signal::consts::*;
use crate::system::signal::{signal_name, SignalInfo, SignalNumber};
use crate::system::wait::{Wait, WaitError, WaitOptions, WaitStatus, ANY_CHILD};

use super::Shell;

/// A reaped change in the state of one child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChildEvent {
    Exited { pid: ProcessId },
    Terminated { pid: ProcessId, signal: SignalNumber },
    Stopped { pid: ProcessId, signal: SignalNumber },
}

impl ChildEvent {
    fn from_status(pid: ProcessId, status: &WaitStatus) -> Option<Self> {
        if status.did_exit() {
            Some(Self::Exited { pid })
        } else if let Some(signal) = status.term_signal() {
            Some(Self::Terminated { pid, signal })
        } else if let Some(signal) = status.stop_signal() {
            Some(Self::Stopped { pid, signal })
        } else {
            None
        }
    }
}

/// Reap every child with a pending status change, including stopped ones.
///
/// One delivery of `SIGCHLD` can stand for any number of simultaneous child
/// events, so this keeps calling `waitpid` until the kernel has nothing left
/// to report.
pub(super) fn drain_child_events() -> Vec<ChildEvent> {
    let mut events = Vec::new();

    loop {
        match ANY_CHILD.wait(WaitOptions::new().no_hang().untraced()) {
            Ok((pid, status)) => {
                if let Some(event) = ChildEvent::from_status(pid, &status) {
                    events.push(event);
                }
            }
            Err(WaitError::NotReady) => break,
            Err(WaitError::Io(err)) => {
                if err.raw_os_error() != Some(libc::ECHILD) {
                    dev_warn!("cannot reap children: {err}");
                }
                break;
            }
        }
    }

    events
}

/// Record one child event in the job table. Terminations by signal and stops
/// are announced; a normal exit removes the job silently. Events for
/// untracked processes are dropped.
pub(super) fn apply_child_event(jobs: &mut JobTable, event: ChildEvent) {
    match event {
        ChildEvent::Exited { pid } => {
            jobs.remove(pid);
        }
        ChildEvent::Terminated { pid, signal } => {
            if let Some(job) = jobs.get_pid(pid) {
                println_ignore_io_error!(
                    "Job [{}] ({pid}) terminated by signal {signal}",
                    job.jid
                );
            }
            jobs.remove(pid);
        }
        ChildEvent::Stopped { pid, signal } => {
            if let Some(job) = jobs.get_pid_mut(pid) {
                job.state = JobState::Stopped;
                println_ignore_io_error!("Job [{}] ({pid}) stopped by signal {signal}", job.jid);
            }
        }
    }
}

/// Pass a terminal-generated signal on to the foreground job's process
/// group. Does nothing when no job is in the foreground.
pub(super) fn forward_to_foreground(jobs: &JobTable, signal: SignalNumber) {
    let Some(pid) = jobs.foreground_pid() else {
        return;
    };

    if let Err(err) = killpg(pid, signal) {
        dev_warn!(
            "cannot forward {} to job group {pid}: {err}",
            signal_name(signal)
        );
    }
}

impl Shell {
    /// Receive one queued signal from the stream and act on it.
    pub(super) fn relay_signal(&mut self) {
        match self.signal_stream.recv() {
            Ok(info) => self.dispatch_signal(&info),
            Err(err) => dev_warn!("cannot receive signal information: {err}"),
        }
    }

    fn dispatch_signal(&mut self, info: &SignalInfo) {
        dev_info!("received {} from {}", signal_name(info.signal()), info.pid());

        match info.signal() {
            SIGCHLD => {
                for event in drain_child_events() {
                    apply_child_event(&mut self.jobs, event);
                }
            }
            signal @ (SIGINT | SIGTSTP) => forward_to_foreground(&self.jobs, signal),
            SIGQUIT => {
                println_ignore_io_error!("Terminating after receipt of SIGQUIT signal");
                exit(1);
            }
            signal => dev_warn!("unexpected {} on the signal stream", signal_name(signal)),
        }
    }

    /// Block until `pid` is no longer the foreground job, relaying every
    /// signal that arrives in the meantime.
    ///
    /// The wait ends when the relay reaps the job's termination or stop, or
    /// would end immediately if the job was never in the foreground. There is
    /// no timeout.
    pub(super) fn wait_foreground(&mut self, pid: ProcessId) {
        while self.jobs.foreground_pid() == Some(pid) {
            match self.signal_stream.recv() {
                Ok(info) => self.dispatch_signal(&info),
                Err(err) if was_interrupted(&err) => continue,
                Err(err) => {
                    dev_warn!("cannot receive signal information: {err}");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{apply_child_event, forward_to_foreground, ChildEvent};
    use crate::jobs::{JobState, JobTable};
    use crate::system::interface::ProcessId;
    use crate::system::signal::consts::SIGINT;

    // larger than any real pid, so stray signals go nowhere
    const FAKE_PID: i32 = 99999999;

    fn pid(id: i32) -> ProcessId {
        ProcessId::new(id)
    }

    #[test]
    fn exit_event_removes_the_job() {
        let mut jobs = JobTable::new();
        jobs.add(pid(100), JobState::Background, "a &").unwrap();
        jobs.add(pid(200), JobState::Background, "b &").unwrap();

        apply_child_event(&mut jobs, ChildEvent::Exited { pid: pid(100) });

        assert!(jobs.get_pid(pid(100)).is_none());
        assert!(jobs.get_pid(pid(200)).is_some());
    }

    #[test]
    fn termination_event_removes_the_job() {
        let mut jobs = JobTable::new();
        jobs.add(pid(100), JobState::Foreground, "sleep 100").unwrap();

        apply_child_event(
            &mut jobs,
            ChildEvent::Terminated {
                pid: pid(100),
                signal: SIGINT,
            },
        );

        assert!(jobs.get_pid(pid(100)).is_none());
        assert_eq!(jobs.foreground_pid(), None);
    }

    #[test]
    fn stop_event_keeps_the_job_as_stopped() {
        let mut jobs = JobTable::new();
        jobs.add(pid(100), JobState::Foreground, "sleep 100").unwrap();

        apply_child_event(
            &mut jobs,
            ChildEvent::Stopped {
                pid: pid(100),
                signal: libc::SIGTSTP,
            },
        );

        let job = jobs.get_pid(pid(100)).unwrap();
        assert_eq!(job.state, JobState::Stopped);
        // a stopped job is no longer in the foreground, so a waiter returns
        assert_eq!(jobs.foreground_pid(), None);
    }

    #[test]
    fn events_for_untracked_processes_are_dropped() {
        let mut jobs = JobTable::new();
        jobs.add(pid(100), JobState::Background, "a &").unwrap();

        apply_child_event(&mut jobs, ChildEvent::Exited { pid: pid(999) });
        apply_child_event(
            &mut jobs,
            ChildEvent::Stopped {
                pid: pid(999),
                signal: libc::SIGTSTP,
            },
        );

        assert_eq!(jobs.iter().count(), 1);
        assert_eq!(
            jobs.get_pid(pid(100)).unwrap().state,
            JobState::Background
        );
    }

    #[test]
    fn forwarding_without_a_foreground_job_is_a_no_op() {
        let mut jobs = JobTable::new();
        jobs.add(pid(FAKE_PID), JobState::Background, "a &").unwrap();

        forward_to_foreground(&jobs, SIGINT);

        assert_eq!(jobs.iter().count(), 1);
    }
}
