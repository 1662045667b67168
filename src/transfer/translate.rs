//! Line ending translation for ASCII (TYPE A) transfers
//!
//! The wire form of text is CRLF-terminated lines; the local form uses the
//! platform line ending. Both translators are chunk-oriented and carry
//! state across chunk boundaries, since a CRLF pair may be split between
//! two reads.

/// Line ending of local text files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn native() -> Self {
        if cfg!(windows) {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }
}

/// Wire CRLF to local line ending
#[derive(Debug)]
pub struct AsciiDecoder {
    ending: LineEnding,
    pending_cr: bool,
}

impl AsciiDecoder {
    pub fn new(ending: LineEnding) -> Self {
        Self {
            ending,
            pending_cr: false,
        }
    }

    pub fn decode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        let mut rest = input;

        if self.pending_cr {
            self.pending_cr = false;
            if rest.first() == Some(&b'\n') {
                out.extend_from_slice(self.ending.as_bytes());
                rest = &rest[1..];
            } else {
                out.push(b'\r');
            }
        }

        while let Some(i) = memchr::memchr(b'\r', rest) {
            out.extend_from_slice(&rest[..i]);
            match rest.get(i + 1) {
                Some(b'\n') => {
                    out.extend_from_slice(self.ending.as_bytes());
                    rest = &rest[i + 2..];
                }
                Some(_) => {
                    // bare CR is data
                    out.push(b'\r');
                    rest = &rest[i + 1..];
                }
                None => {
                    self.pending_cr = true;
                    return;
                }
            }
        }
        out.extend_from_slice(rest);
    }

    /// Flushes a CR held back at the end of the stream.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        if self.pending_cr {
            self.pending_cr = false;
            out.push(b'\r');
        }
    }
}

/// Local line ending to wire CRLF
#[derive(Debug, Default)]
pub struct AsciiEncoder {
    last_cr: bool,
}

impl AsciiEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// LF becomes CRLF unless it already follows a CR.
    pub fn encode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        let mut rest = input;

        while let Some(i) = memchr::memchr(b'\n', rest) {
            let preceded_by_cr = if i > 0 {
                rest[i - 1] == b'\r'
            } else {
                self.last_cr
            };

            out.extend_from_slice(&rest[..i]);
            if !preceded_by_cr {
                out.push(b'\r');
            }
            out.push(b'\n');

            self.last_cr = false;
            rest = &rest[i + 1..];
        }

        out.extend_from_slice(rest);
        if let Some(&last) = rest.last() {
            self.last_cr = last == b'\r';
        }
    }
}
