/// Longest line kept, in bytes. Anything past it is dropped.
pub const MAX_LINE_BYTES: usize = 16 * 1024;

/// Splits a byte stream into display lines.
///
/// A bare `\r` rewinds the current line, the way a terminal would show a
/// progress counter; `\r\n` is an ordinary terminator.
#[derive(Debug, Default)]
pub struct LineSplitter {
    partial: Vec<u8>,
    pending_cr: bool,
}

impl LineSplitter {
    pub fn feed(&mut self, bytes: &[u8], mut emit: impl FnMut(String)) {
        for &byte in bytes {
            match byte {
                b'\n' => {
                    self.pending_cr = false;
                    emit(self.take_line());
                }
                b'\r' => self.pending_cr = true,
                _ => {
                    if self.pending_cr {
                        self.partial.clear();
                        self.pending_cr = false;
                    }
                    if self.partial.len() < MAX_LINE_BYTES {
                        self.partial.push(byte);
                    }
                }
            }
        }
    }

    /// Flushes an unterminated trailing line, if any.
    pub fn finish(&mut self) -> Option<String> {
        self.pending_cr = false;
        if self.partial.is_empty() {
            return None;
        }
        let line = self.take_line();
        (!line.is_empty()).then_some(line)
    }

    fn take_line(&mut self) -> String {
        let line = sanitize(&String::from_utf8_lossy(&self.partial));
        self.partial.clear();
        line
    }
}

/// Drops escape sequences and control characters that would move the cursor.
pub fn sanitize(text: &str) -> String {
    let mut clean = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\t' => clean.push(' '),
            '\u{1b}' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    // CSI ends at the first byte in 0x40..=0x7e
                    for next in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&next) {
                            break;
                        }
                    }
                }
            }
            c if c.is_control() => {}
            c => clean.push(c),
        }
    }
    clean
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(chunks: &[&[u8]]) -> Vec<String> {
        let mut splitter = LineSplitter::default();
        let mut lines = Vec::new();
        for chunk in chunks {
            splitter.feed(chunk, |line| lines.push(line));
        }
        lines.extend(splitter.finish());
        lines
    }

    #[test]
    fn splits_across_chunk_boundaries() {
        let lines = split(&[b"hel", b"lo\nwor", b"ld\n"]);
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[test]
    fn flushes_trailing_partial_line() {
        assert_eq!(split(&[b"one\ntwo"]), vec!["one", "two"]);
    }

    #[test]
    fn empty_stream_yields_nothing() {
        assert!(split(&[]).is_empty());
    }

    #[test]
    fn carriage_return_rewinds_line() {
        assert_eq!(split(&[b"10\r9\r8\rdone\n"]), vec!["done"]);
    }

    #[test]
    fn crlf_is_a_plain_terminator() {
        assert_eq!(split(&[b"a\r", b"\nb\r\n"]), vec!["a", "b"]);
    }

    #[test]
    fn trailing_carriage_return_keeps_last_state() {
        assert_eq!(split(&[b"Countdown: 0\r"]), vec!["Countdown: 0"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(split(&[b"ok \xff\n"]), vec!["ok \u{fffd}"]);
    }

    #[test]
    fn overlong_lines_are_capped() {
        let long = vec![b'x'; MAX_LINE_BYTES + 100];
        let lines = split(&[&long, b"\n"]);
        assert_eq!(lines[0].len(), MAX_LINE_BYTES);
    }

    #[test]
    fn sanitize_strips_colors_and_controls() {
        assert_eq!(sanitize("\u{1b}[31mred\u{1b}[0m\tok\u{7}"), "red ok");
    }
}
