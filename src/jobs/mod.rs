//! The job table: bookkeeping for every child process the shell tracks.
//!
//! Each job is the leader of its own process group, so a job's process group
//! id is its process id. Signaling `killpg(job.pid, ..)` therefore reaches
//! the whole job and nothing else.

use std::fmt;

use crate::log::job_debug;
use crate::system::interface::ProcessId;

/// How many jobs can be tracked at any point in time.
pub(crate) const MAX_JOBS: usize = 16;

/// A shell-visible job identifier, assigned when the job is registered.
///
/// Job ids are small positive integers; `0` is never a valid job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct JobId(u32);

impl JobId {
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    pub(crate) const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle state of a tracked job. A free table slot is represented by
/// the absence of a job, not by a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobState {
    /// The shell is blocked waiting on this job.
    Foreground,
    /// The job runs independently of the prompt.
    Background,
    /// The job was suspended and can be resumed with `fg` or `bg`.
    Stopped,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the words used by the `jobs` listing
        f.write_str(match self {
            JobState::Foreground => "Foreground",
            JobState::Background => "Running",
            JobState::Stopped => "Stopped",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Job {
    pub(crate) pid: ProcessId,
    pub(crate) jid: JobId,
    pub(crate) state: JobState,
    pub(crate) command_line: String,
}

impl Job {
    /// The process group to signal in order to reach this job and only this
    /// job. Every job is spawned as its own group leader.
    pub(crate) fn process_group(&self) -> ProcessId {
        self.pid
    }
}

/// Error returned by [`JobTable::add`] when every slot is occupied.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct JobTableFull;

pub(crate) struct JobTable {
    slots: [Option<Job>; MAX_JOBS],
    next_jid: u32,
}

impl JobTable {
    pub(crate) fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            next_jid: 1,
        }
    }

    /// Register a new job in the first free slot and return its fresh job id.
    ///
    /// Fails without mutating the table when all slots are occupied. The job
    /// id counter rolls over to 1 once it would exceed the table capacity;
    /// ids freed by [`JobTable::remove`] become assignable again as soon as
    /// the highest id is released.
    pub(crate) fn add(
        &mut self,
        pid: ProcessId,
        state: JobState,
        command_line: &str,
    ) -> Result<JobId, JobTableFull> {
        debug_assert!(pid.get() > 0);
        debug_assert!(state != JobState::Foreground || self.foreground_pid().is_none());

        let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) else {
            return Err(JobTableFull);
        };

        let jid = JobId::new(self.next_jid);
        self.next_jid += 1;
        if self.next_jid > MAX_JOBS as u32 {
            self.next_jid = 1;
        }

        *slot = Some(Job {
            pid,
            jid,
            state,
            command_line: command_line.to_string(),
        });

        job_debug!("added job [{jid}] {pid} {command_line}");

        Ok(jid)
    }

    /// Clear the slot of the job with the given process id. Returns `false`
    /// if no such job exists. On success the next assignable job id is
    /// recomputed as one past the highest id still in use.
    pub(crate) fn remove(&mut self, pid: ProcessId) -> bool {
        let mut removed = false;

        for slot in self.slots.iter_mut() {
            let Some(job) = slot else { continue };
            if job.pid != pid {
                continue;
            }

            job_debug!("removed job [{}] {} {}", job.jid, job.pid, job.command_line);
            *slot = None;
            removed = true;
            break;
        }

        if removed {
            self.next_jid = self.highest_job_id() + 1;
        }

        removed
    }

    pub(crate) fn get_pid(&self, pid: ProcessId) -> Option<&Job> {
        self.iter().find(|job| job.pid == pid)
    }

    pub(crate) fn get_pid_mut(&mut self, pid: ProcessId) -> Option<&mut Job> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.as_mut())
            .find(|job| job.pid == pid)
    }

    pub(crate) fn get_jid_mut(&mut self, jid: JobId) -> Option<&mut Job> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.as_mut())
            .find(|job| job.jid == jid)
    }

    /// The process id of the current foreground job, if any. At most one job
    /// is in the foreground state at any instant.
    pub(crate) fn foreground_pid(&self) -> Option<ProcessId> {
        self.iter()
            .find(|job| job.state == JobState::Foreground)
            .map(|job| job.pid)
    }

    /// The largest job id currently in use, or 0 when the table is empty.
    pub(crate) fn highest_job_id(&self) -> u32 {
        self.iter().map(|job| job.jid.get()).max().unwrap_or(0)
    }

    /// The tracked jobs, in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{JobId, JobState, JobTable, JobTableFull, MAX_JOBS};
    use crate::system::interface::ProcessId;

    fn pid(id: i32) -> ProcessId {
        ProcessId::new(id)
    }

    #[test]
    fn ids_are_assigned_in_launch_order() {
        let mut table = JobTable::new();

        for n in 1..=5 {
            let jid = table
                .add(pid(1000 + n), JobState::Background, "sleep 100 &")
                .unwrap();
            assert_eq!(jid, JobId::new(n as u32));
        }

        let listed: Vec<u32> = table.iter().map(|job| job.jid.get()).collect();
        assert_eq!(listed, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn ids_are_unique_and_nonzero() {
        let mut table = JobTable::new();
        table.add(pid(100), JobState::Background, "a &").unwrap();
        table.add(pid(200), JobState::Stopped, "b").unwrap();
        table.add(pid(300), JobState::Foreground, "c").unwrap();

        let mut ids: Vec<u32> = table.iter().map(|job| job.jid.get()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|&id| id != 0));
    }

    #[test]
    fn at_most_one_foreground_job() {
        let mut table = JobTable::new();
        table.add(pid(100), JobState::Background, "a &").unwrap();
        table.add(pid(200), JobState::Foreground, "b").unwrap();

        assert_eq!(table.foreground_pid(), Some(pid(200)));
        assert_eq!(
            table
                .iter()
                .filter(|job| job.state == JobState::Foreground)
                .count(),
            1
        );

        table.get_pid_mut(pid(200)).unwrap().state = JobState::Stopped;
        assert_eq!(table.foreground_pid(), None);
    }

    #[test]
    fn removal_recomputes_next_id() {
        let mut table = JobTable::new();
        table.add(pid(100), JobState::Background, "a &").unwrap();
        table.add(pid(200), JobState::Background, "b &").unwrap();
        table.add(pid(300), JobState::Background, "c &").unwrap();

        // freeing the highest id makes it assignable again
        assert!(table.remove(pid(300)));
        assert_eq!(table.highest_job_id(), 2);
        let jid = table.add(pid(400), JobState::Background, "d &").unwrap();
        assert_eq!(jid, JobId::new(3));

        // freeing a lower id does not: the next id stays one past the highest
        assert!(table.remove(pid(100)));
        let jid = table.add(pid(500), JobState::Background, "e &").unwrap();
        assert_eq!(jid, JobId::new(4));
    }

    #[test]
    fn remove_unknown_pid_is_a_no_op() {
        let mut table = JobTable::new();
        table.add(pid(100), JobState::Background, "a &").unwrap();

        assert!(!table.remove(pid(999)));
        assert_eq!(table.iter().count(), 1);
    }

    #[test]
    fn table_full_leaves_existing_entries_unchanged() {
        let mut table = JobTable::new();
        for n in 0..MAX_JOBS {
            table
                .add(pid(1000 + n as i32), JobState::Background, "x &")
                .unwrap();
        }

        assert_eq!(
            table.add(pid(5000), JobState::Background, "y &"),
            Err(JobTableFull)
        );
        assert_eq!(table.iter().count(), MAX_JOBS);
        assert!(table.get_pid(pid(5000)).is_none());
    }

    #[test]
    fn id_counter_wraps_to_one_at_capacity() {
        let mut table = JobTable::new();
        for n in 0..MAX_JOBS {
            table
                .add(pid(1000 + n as i32), JobState::Background, "x &")
                .unwrap();
        }

        // drain the whole table; the last removal resets the counter to 1
        for n in 0..MAX_JOBS {
            assert!(table.remove(pid(1000 + n as i32)));
        }

        let jid = table.add(pid(2000), JobState::Background, "z &").unwrap();
        assert_eq!(jid, JobId::new(1));
    }

    #[test]
    fn lookup_by_pid_and_jid() {
        let mut table = JobTable::new();
        let jid = table.add(pid(123), JobState::Stopped, "vim notes").unwrap();

        assert_eq!(table.get_pid(pid(123)).unwrap().jid, jid);
        assert_eq!(table.get_jid_mut(jid).unwrap().pid, pid(123));
        assert!(table.get_pid(pid(321)).is_none());
        assert!(table.get_jid_mut(JobId::new(9)).is_none());
    }

    #[test]
    fn job_is_its_own_process_group() {
        let mut table = JobTable::new();
        table.add(pid(123), JobState::Background, "a &").unwrap();

        let job = table.get_pid(pid(123)).unwrap();
        assert_eq!(job.process_group(), job.pid);
    }
}
