//! A tiny Brainfuck interpreter library.
//!
//! The engine runs on a memory tape that starts as a single zeroed cell and
//! grows rightward on demand, with a single data pointer.
//!
//! Features and behaviors:
//! - Growable tape: moving right past the last cell appends one zero cell;
//!   moving left from cell 0 is an error, never a wrap or a clamp.
//! - Cell arithmetic wraps modulo 256 in both directions.
//! - Input `,` reads one byte from the input stream, on demand; at
//!   end-of-input the current cell is left unchanged.
//! - Output `.` writes the current cell as one byte to the output sink.
//! - Loops `[]` run iteratively via a stack of entry positions; bracket
//!   pairing is checked at runtime only (no static pre-validation).
//! - Any non-opcode byte is a comment: skipped, and free of charge.
//! - An operation ceiling (100,000 dispatches by default) aborts runaway
//!   programs; it can be raised or disabled per run.
//!
//! Quick start:
//!
//! ```
//! use std::io;
//! use bfi::Interpreter;
//!
//! // The classic counter loop: 6 * 10 + 5 = 65 = 'A'
//! let mut interp = Interpreter::new();
//! let mut out = Vec::new();
//! interp
//!     .run(b"++++++[>++++++++++<-]>+++++.", &mut io::empty(), &mut out)
//!     .expect("program should run");
//! assert_eq!(out, b"A");
//! ```

pub mod cli_util;
pub mod interpreter;
pub mod repl;
pub mod submission;
pub mod tape;

pub use interpreter::{BracketMismatchKind, DEFAULT_OP_LIMIT, Interpreter, InterpreterError};
pub use submission::{Submission, SubmissionError};
pub use tape::{Tape, TapeUnderflow};
