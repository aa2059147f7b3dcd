use std::io::{self, Write};

use crate::interpreter::InterpreterError;
use crate::submission::SubmissionError;

/// Pretty-print an [`InterpreterError`] against the source it was raised in.
/// With `program = Some("bfi")` messages are prefixed "bfi: ..." for CLI use.
pub fn print_interpreter_error(program: Option<&str>, code: &[u8], err: &InterpreterError) {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    match err {
        InterpreterError::TapeUnderflow { ip } => {
            let msg = prefix_program("Runtime error: tape underflow (head at cell 0)");
            print_error_with_context(&msg, code, *ip);
        }
        InterpreterError::BracketMismatch { ip, kind } => {
            let msg = prefix_program(&format!("Runtime error: unmatched bracket {kind}"));
            print_error_with_context(&msg, code, *ip);
        }
        InterpreterError::OpLimitExceeded { limit } => {
            eprintln!(
                "{}",
                prefix_program(&format!(
                    "Execution aborted: operation limit exceeded ({limit})"
                ))
            );
            let _ = io::stderr().flush();
        }
        InterpreterError::Io { ip, source } => {
            let msg = prefix_program(&format!("I/O error: {source}"));
            print_error_with_context(&msg, code, *ip);
        }
    }
}

/// Report a submission-format failure on stderr.
pub fn print_submission_error(program: Option<&str>, err: &SubmissionError) {
    match program {
        Some(p) => eprintln!("{p}: {err}"),
        None => eprintln!("{err}"),
    }
    let _ = io::stderr().flush();
}

/// Print a concise error with instruction index and a caret context window.
/// Positions are byte offsets into `code`; non-UTF-8 bytes render lossily.
pub fn print_error_with_context(prefix: &str, code: &[u8], pos: usize) {
    eprintln!("{prefix} at instruction {pos}");

    // Show a short window around the position for context
    const WINDOW_BYTES: usize = 32;

    let start = pos.saturating_sub(WINDOW_BYTES);
    let end = (pos + WINDOW_BYTES + 1).min(code.len());
    let slice = String::from_utf8_lossy(&code[start..end]);

    eprintln!("  {}", slice);

    // Caret under the exact position
    let caret_offset = pos.saturating_sub(start);
    let mut underline = String::new();
    for _ in 0..caret_offset {
        underline.push(' ');
    }
    underline.push('^');
    eprintln!("  {}", underline);
    let _ = io::stderr().flush();
}
