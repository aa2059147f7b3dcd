//! The textual submission format wrapped around a program.
//!
//! A submission declares how much program input and how many code lines to
//! expect, then carries both:
//!
//! ```text
//! <input byte count> <code line count>
//! <input bytes>$
//! <code line 1>
//! ...
//! <code line N>
//! ```
//!
//! The two counts are whitespace-separated tokens and may span lines. The
//! input blob runs up to a `$` delimiter, which is consumed and discarded;
//! without a `$` the rest of the stream is taken as the blob. Code lines
//! are concatenated without their line terminators. Both declared counts
//! are validated against what was actually read; the engine downstream
//! does not re-validate them.

use std::io::{self, BufRead};

/// A parsed submission: the program-input blob and the assembled code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub input: Vec<u8>,
    pub code: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// The leading byte/line counts were missing or not unsigned integers.
    #[error("malformed header: expected an input byte count and a code line count")]
    MalformedHeader,

    /// The input blob's length differs from the declared byte count.
    #[error("invalid input, expected {expected} characters, received {received}")]
    InputLengthMismatch { expected: usize, received: usize },

    /// The stream ended before the declared number of code lines.
    #[error("expected {expected} lines, received {received}")]
    LineCountMismatch { expected: usize, received: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Submission {
    /// Read and validate one submission from `reader` in a single pass.
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self, SubmissionError> {
        let input_len = read_count(reader)?;
        let line_count = read_count(reader)?;

        skip_whitespace(reader)?;
        let input = read_until_delimiter(reader, b'$')?;
        if input.len() != input_len {
            return Err(SubmissionError::InputLengthMismatch {
                expected: input_len,
                received: input.len(),
            });
        }

        skip_whitespace(reader)?;
        let mut code = String::new();
        let mut received = 0;
        for _ in 0..line_count {
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            code.push_str(&line);
            received += 1;
        }
        if received != line_count {
            return Err(SubmissionError::LineCountMismatch {
                expected: line_count,
                received,
            });
        }

        Ok(Submission { input, code })
    }
}

fn read_count<R: BufRead>(reader: &mut R) -> Result<usize, SubmissionError> {
    let token = read_token(reader)?;
    token
        .parse()
        .map_err(|_| SubmissionError::MalformedHeader)
}

/// Next whitespace-delimited token, or an empty string at end of stream.
fn read_token<R: BufRead>(reader: &mut R) -> io::Result<String> {
    skip_whitespace(reader)?;
    let mut token = Vec::new();
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        let run = buf
            .iter()
            .take_while(|byte| !byte.is_ascii_whitespace())
            .count();
        token.extend_from_slice(&buf[..run]);
        let hit_whitespace = run < buf.len();
        reader.consume(run);
        if hit_whitespace {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&token).into_owned())
}

fn skip_whitespace<R: BufRead>(reader: &mut R) -> io::Result<()> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(());
        }
        let run = buf
            .iter()
            .take_while(|byte| byte.is_ascii_whitespace())
            .count();
        let done = run < buf.len();
        reader.consume(run);
        if done {
            return Ok(());
        }
    }
}

/// Bytes up to (and excluding) `delimiter`; the delimiter is consumed.
/// Without one, everything up to end of stream.
fn read_until_delimiter<R: BufRead>(reader: &mut R, delimiter: u8) -> io::Result<Vec<u8>> {
    let mut blob = Vec::new();
    reader.read_until(delimiter, &mut blob)?;
    if blob.last() == Some(&delimiter) {
        blob.pop();
    }
    Ok(blob)
}
