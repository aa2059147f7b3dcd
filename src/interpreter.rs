use std::fmt;
use std::io::{self, BufRead, Write};

use crate::tape::Tape;

/// Default ceiling on the number of dispatched instructions per run.
pub const DEFAULT_OP_LIMIT: u64 = 100_000;

/// Errors that can occur while interpreting a program.
///
/// Every error is terminal to the current run. Output already written to
/// the sink stays written; the output stream is one-way.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// `<` was dispatched while the head was on cell 0.
    #[error("tape underflow at instruction {ip}: head already at cell 0")]
    TapeUnderflow { ip: usize },

    /// A `[` or `]` could not be paired with its counterpart.
    #[error("unmatched bracket at instruction {ip}: {kind}")]
    BracketMismatch {
        ip: usize,
        kind: BracketMismatchKind,
    },

    /// The configured dispatch ceiling was reached.
    #[error("Execution aborted: operation limit exceeded ({limit})")]
    OpLimitExceeded { limit: u64 },

    /// The input or output stream failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: io::Error,
    },
}

/// Which way a bracket failed to pair up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketMismatchKind {
    /// A `]` with no open loop to close.
    Unopened,
    /// A `[` whose forward scan ran off the end of the program.
    Unclosed,
}

impl fmt::Display for BracketMismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketMismatchKind::Unopened => write!(f, "']' without a matching '['"),
            BracketMismatchKind::Unclosed => write!(f, "'[' without a matching ']'"),
        }
    }
}

/// The execution engine: a growable [`Tape`] plus an instruction dispatcher.
///
/// One interpreter drives one run. The loop construct is implemented with a
/// stack of `[` positions and a program counter that the loop instructions
/// may rewrite, so repetition never recurses.
///
/// Bracket pairing is checked at runtime only, and asymmetrically: a `]`
/// with no open loop always fails, while a `[` is only scanned for its
/// partner when its guard cell is zero. A program that ends with active
/// loops still on the stack is not an error.
pub struct Interpreter {
    tape: Tape,
    op_limit: Option<u64>,
}

impl Interpreter {
    /// New interpreter with the default operation ceiling.
    pub fn new() -> Self {
        Self::with_op_limit(Some(DEFAULT_OP_LIMIT))
    }

    /// New interpreter with an explicit ceiling. `None` disables the guard.
    pub fn with_op_limit(op_limit: Option<u64>) -> Self {
        Self {
            tape: Tape::new(),
            op_limit,
        }
    }

    /// The tape, for inspection after a run.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Execute `code` against `input` and `output`.
    ///
    /// Recognized opcodes are `+ - < > . , [ ]`; any other byte is skipped
    /// for free. Input is consumed one byte at a time, on demand; at
    /// end-of-input `,` leaves the current cell unchanged. Returns the
    /// number of instructions actually dispatched.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        code: &[u8],
        input: &mut R,
        output: &mut W,
    ) -> Result<u64, InterpreterError> {
        let mut loop_stack: Vec<usize> = Vec::new();
        let mut dispatched: u64 = 0;
        let mut pc = 0;

        while pc < code.len() {
            let op = code[pc];
            if !is_opcode(op) {
                pc += 1;
                continue;
            }

            if let Some(limit) = self.op_limit {
                if dispatched >= limit {
                    return Err(InterpreterError::OpLimitExceeded { limit });
                }
            }
            dispatched += 1;

            match op {
                b'+' => self.tape.increment(),
                b'-' => self.tape.decrement(),
                b'<' => {
                    self.tape
                        .move_left()
                        .map_err(|_| InterpreterError::TapeUnderflow { ip: pc })?;
                }
                b'>' => self.tape.move_right(),
                b'.' => {
                    output
                        .write_all(&[self.tape.get()])
                        .map_err(|source| InterpreterError::Io { ip: pc, source })?;
                }
                b',' => {
                    let buf = input
                        .fill_buf()
                        .map_err(|source| InterpreterError::Io { ip: pc, source })?;
                    // End-of-input leaves the cell as it was.
                    if let Some(&byte) = buf.first() {
                        self.tape.set(byte);
                        input.consume(1);
                    }
                }
                b'[' => {
                    if self.tape.get() != 0 {
                        loop_stack.push(pc);
                    } else {
                        // Skip the whole body: land on the matching ']' so the
                        // shared advance below steps past it.
                        pc = matching_close(code, pc)?;
                    }
                }
                b']' => match loop_stack.last() {
                    None => {
                        return Err(InterpreterError::BracketMismatch {
                            ip: pc,
                            kind: BracketMismatchKind::Unopened,
                        });
                    }
                    Some(&open) => {
                        if self.tape.get() != 0 {
                            // Re-enter the body just past the stored '['. Not
                            // popped; the loop may run again.
                            pc = open;
                        } else {
                            loop_stack.pop();
                        }
                    }
                },
                _ => unreachable!("is_opcode admitted a non-opcode byte"),
            }

            pc += 1;
        }

        Ok(dispatched)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_opcode(byte: u8) -> bool {
    matches!(
        byte,
        b'+' | b'-' | b'<' | b'>' | b'.' | b',' | b'[' | b']'
    )
}

/// Position of the `]` matching the `[` at `open`, counting nested pairs.
/// Only brackets are inspected; no tape or dispatcher state is touched.
fn matching_close(code: &[u8], open: usize) -> Result<usize, InterpreterError> {
    let mut depth = 0usize;
    let mut scan = open;
    loop {
        scan += 1;
        match code.get(scan) {
            None => {
                return Err(InterpreterError::BracketMismatch {
                    ip: open,
                    kind: BracketMismatchKind::Unclosed,
                });
            }
            Some(b'[') => depth += 1,
            Some(b']') if depth == 0 => return Ok(scan),
            Some(b']') => depth -= 1,
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, empty, sink};

    fn run_collect(code: &[u8], input: &[u8]) -> Result<(Vec<u8>, u64), InterpreterError> {
        let mut interp = Interpreter::new();
        let mut out = Vec::new();
        let dispatched = interp.run(code, &mut Cursor::new(input.to_vec()), &mut out)?;
        Ok((out, dispatched))
    }

    #[test]
    fn counter_loop_prints_letter_a() {
        let (out, _) = run_collect(b"++++++[>++++++++++<-]>+++++.", b"").unwrap();
        assert_eq!(out, b"A");
    }

    #[test]
    fn echoes_a_single_input_byte() {
        let (out, _) = run_collect(b",.", b"Z").unwrap();
        assert_eq!(out, b"Z");
    }

    #[test]
    fn end_of_input_leaves_cell_unchanged() {
        // Cell holds 3 before ','; exhausted input must not zero it.
        let (out, _) = run_collect(b"+++,.", b"").unwrap();
        assert_eq!(out, [3]);
    }

    #[test]
    fn comment_bytes_are_skipped_for_free() {
        let (out, dispatched) = run_collect(b"+ two increments! +.", b"").unwrap();
        assert_eq!(out, [2]);
        // Only the two '+' and the '.' count as work.
        assert_eq!(dispatched, 3);
    }

    #[test]
    fn zero_guard_skips_loop_body_entirely() {
        let (out, dispatched) = run_collect(b"[.]", b"").unwrap();
        assert!(out.is_empty());
        // The '[' alone is dispatched; the body is skipped, not executed.
        assert_eq!(dispatched, 1);
    }

    #[test]
    fn zero_guard_skip_honors_nesting() {
        // The skip must not stop at the inner ']'.
        let (out, _) = run_collect(b"[[-].]", b"").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn loop_drains_cell_to_zero() {
        let (_, dispatched) = run_collect(b"++[-]", b"").unwrap();
        // ++, '[', then two rounds of '-' ']' with one extra '-' dispatch:
        // + + [ - ] - ] = 7 dispatches total.
        assert_eq!(dispatched, 7);
    }

    #[test]
    fn nested_loops_keep_the_stack_balanced() {
        // 3 * 4 via an inner loop; lands 12 in cell 1.
        let mut interp = Interpreter::new();
        let mut out = Vec::new();
        interp
            .run(b"+++[>++++<-]>.", &mut empty(), &mut out)
            .unwrap();
        assert_eq!(out, [12]);
    }

    #[test]
    fn lone_close_bracket_is_unopened() {
        let err = run_collect(b"]", b"").unwrap_err();
        assert!(matches!(
            err,
            InterpreterError::BracketMismatch {
                ip: 0,
                kind: BracketMismatchKind::Unopened,
            }
        ));
    }

    #[test]
    fn lone_open_bracket_with_zero_guard_is_unclosed() {
        let err = run_collect(b"[", b"").unwrap_err();
        assert!(matches!(
            err,
            InterpreterError::BracketMismatch {
                ip: 0,
                kind: BracketMismatchKind::Unclosed,
            }
        ));
    }

    #[test]
    fn active_open_bracket_at_end_of_program_is_not_checked() {
        // The guard is non-zero, so the '[' is pushed and never scanned for
        // a partner; running off the end with it still active succeeds.
        let (out, dispatched) = run_collect(b"+[", b"").unwrap();
        assert!(out.is_empty());
        assert_eq!(dispatched, 2);
    }

    #[test]
    fn move_left_from_first_cell_underflows() {
        let err = run_collect(b"<", b"").unwrap_err();
        assert!(matches!(err, InterpreterError::TapeUnderflow { ip: 0 }));
    }

    #[test]
    fn underflow_reports_the_offending_position() {
        let err = run_collect(b">>><<<<", b"").unwrap_err();
        assert!(matches!(err, InterpreterError::TapeUnderflow { ip: 6 }));
    }

    #[test]
    fn cell_wraps_on_decrement_from_zero() {
        let mut interp = Interpreter::new();
        interp.run(b"-", &mut empty(), &mut sink()).unwrap();
        assert_eq!(interp.tape().get(), 255);
    }

    #[test]
    fn cell_wraps_on_increment_from_255() {
        let code = vec![b'+'; 256];
        let mut interp = Interpreter::new();
        interp.run(&code, &mut empty(), &mut sink()).unwrap();
        assert_eq!(interp.tape().get(), 0);
    }

    #[test]
    fn op_limit_allows_exactly_the_ceiling() {
        let mut interp = Interpreter::with_op_limit(Some(5));
        let dispatched = interp.run(b"+++++", &mut empty(), &mut sink()).unwrap();
        assert_eq!(dispatched, 5);
    }

    #[test]
    fn op_limit_fails_on_the_next_dispatch() {
        let mut interp = Interpreter::with_op_limit(Some(5));
        let err = interp.run(b"++++++", &mut empty(), &mut sink()).unwrap_err();
        assert!(matches!(
            err,
            InterpreterError::OpLimitExceeded { limit: 5 }
        ));
    }

    #[test]
    fn op_limit_preserves_output_written_so_far() {
        let mut interp = Interpreter::with_op_limit(Some(3));
        let mut out = Vec::new();
        let err = interp.run(b"..+[]", &mut empty(), &mut out).unwrap_err();
        assert!(matches!(err, InterpreterError::OpLimitExceeded { .. }));
        assert_eq!(out, [0, 0]);
    }

    #[test]
    fn no_limit_runs_long_programs() {
        // Nested drain loops dispatch well past the default ceiling.
        let mut interp = Interpreter::with_op_limit(None);
        let dispatched = interp
            .run(b"-[>-[-]<-]", &mut empty(), &mut sink())
            .unwrap();
        assert!(dispatched > DEFAULT_OP_LIMIT);
        assert_eq!(interp.tape().get(), 0);
    }

    #[test]
    fn default_ceiling_stops_runaway_programs() {
        let mut interp = Interpreter::new();
        let err = interp.run(b"+[]", &mut empty(), &mut sink()).unwrap_err();
        assert!(matches!(
            err,
            InterpreterError::OpLimitExceeded {
                limit: DEFAULT_OP_LIMIT,
            }
        ));
    }

    #[test]
    fn input_is_consumed_strictly_in_order() {
        let (out, _) = run_collect(b",.,.,.", b"abc").unwrap();
        assert_eq!(out, b"abc");
    }
}
