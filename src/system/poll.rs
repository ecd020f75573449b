use std::{
    collections::BTreeMap,
    io,
    os::fd::{AsRawFd, RawFd},
};

use crate::cutils::cerr;
use libc::{c_short, pollfd, POLLIN};

/// A set of indexed file descriptors to be polled for reading using the `poll` system call.
pub struct PollSet<K> {
    fds: BTreeMap<K, (RawFd, c_short)>,
}

impl<K: Eq + PartialEq + Ord + PartialOrd + Clone> PollSet<K> {
    /// Create an empty set of file descriptors.
    pub const fn new() -> Self {
        Self {
            fds: BTreeMap::new(),
        }
    }

    /// Add a file descriptor under the provided key. The descriptor will be
    /// checked for read readiness.
    ///
    /// If the provided key is already in the set, calling this function will overwrite the file
    /// descriptor for that key.
    pub fn add_fd_read<F: AsRawFd>(&mut self, key: K, fd: &F) {
        self.fds.insert(key, (fd.as_raw_fd(), POLLIN));
    }

    /// Poll the set of file descriptors and return the keys of the descriptors that are ready to
    /// be read, in key order.
    ///
    /// Calling this function will block until one of the file descriptors in the set is ready, or
    /// until a signal arrives (in which case the `Interrupted` error is returned).
    pub fn poll(&mut self) -> io::Result<Vec<K>> {
        let mut fds: Vec<pollfd> = self
            .fds
            .values()
            .map(|&(fd, events)| pollfd {
                fd,
                events,
                revents: 0,
            })
            .collect();

        let n = cerr(unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as _, -1) })?;

        let mut keys = Vec::with_capacity(n as usize);

        for (key, fd) in self.fds.keys().zip(fds) {
            if fd.events & fd.revents & POLLIN != 0 {
                keys.push(key.clone());
            }
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    use super::PollSet;

    #[test]
    fn readable_fd_is_reported() {
        let (rx, mut tx) = UnixStream::pair().unwrap();

        let mut poll_set = PollSet::new();
        poll_set.add_fd_read(0u8, &rx);

        tx.write_all(b"ready").unwrap();

        assert_eq!(poll_set.poll().unwrap(), vec![0u8]);
    }

    #[test]
    fn keys_are_returned_in_order() {
        let (rx1, mut tx1) = UnixStream::pair().unwrap();
        let (rx2, mut tx2) = UnixStream::pair().unwrap();

        let mut poll_set = PollSet::new();
        poll_set.add_fd_read(1u8, &rx2);
        poll_set.add_fd_read(0u8, &rx1);

        tx2.write_all(b"b").unwrap();
        tx1.write_all(b"a").unwrap();

        assert_eq!(poll_set.poll().unwrap(), vec![0u8, 1u8]);
    }
}
