use std::io;

use crate::cutils::{cerr, was_interrupted};

const READ_CHUNK: usize = 512;

/// An input buffer over the raw standard input descriptor.
///
/// The standard library's buffered stdin reads ahead behind the scenes, which
/// would leave `poll` reporting the descriptor as empty while complete lines
/// sit in a hidden buffer. Reading the descriptor directly keeps the poll
/// loop honest.
pub(super) struct LineBuffer {
    data: Vec<u8>,
}

impl LineBuffer {
    pub(super) fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Read more bytes from standard input. Returns the number of bytes read;
    /// zero means end of input.
    pub(super) fn fill(&mut self) -> io::Result<usize> {
        let mut chunk = [0u8; READ_CHUNK];

        let bytes = loop {
            // SAFETY: the chunk is valid for writes of its own length.
            let res = cerr(unsafe {
                libc::read(libc::STDIN_FILENO, chunk.as_mut_ptr().cast(), chunk.len())
            });

            match res {
                Ok(bytes) => break bytes as usize,
                Err(err) if was_interrupted(&err) => continue,
                Err(err) => return Err(err),
            }
        };

        self.data.extend_from_slice(&chunk[..bytes]);

        Ok(bytes)
    }

    /// Remove and return the first complete line, without its newline.
    pub(super) fn take_line(&mut self) -> Option<String> {
        let newline = self.data.iter().position(|&byte| byte == b'\n')?;
        let mut line: Vec<u8> = self.data.drain(..=newline).collect();
        line.pop();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Remove and return the unterminated text left after end of input.
    pub(super) fn take_rest(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.data);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::LineBuffer;

    fn buffer_with(bytes: &[u8]) -> LineBuffer {
        let mut buffer = LineBuffer::new();
        buffer.data.extend_from_slice(bytes);
        buffer
    }

    #[test]
    fn lines_come_out_one_at_a_time() {
        let mut buffer = buffer_with(b"first\nsecond\nthi");

        assert_eq!(buffer.take_line().as_deref(), Some("first"));
        assert_eq!(buffer.take_line().as_deref(), Some("second"));
        // the partial third line is not a line yet
        assert_eq!(buffer.take_line(), None);
        assert_eq!(buffer.take_rest().as_deref(), Some("thi"));
        assert_eq!(buffer.take_rest(), None);
    }

    #[test]
    fn empty_lines_are_preserved() {
        let mut buffer = buffer_with(b"\n\nquit\n");

        assert_eq!(buffer.take_line().as_deref(), Some(""));
        assert_eq!(buffer.take_line().as_deref(), Some(""));
        assert_eq!(buffer.take_line().as_deref(), Some("quit"));
        assert_eq!(buffer.take_line(), None);
    }
}
