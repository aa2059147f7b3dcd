use std::env;
use std::io::{self, IsTerminal, Write};

use nu_ansi_term::{Color, Style};
use reedline::{
    DefaultPrompt, DefaultPromptSegment, Highlighter, HistoryItem, Signal, StyledText,
};

use crate::cli_util;
use crate::interpreter::Interpreter;

pub fn repl_loop() -> io::Result<()> {
    // Initialize interactive line editor
    let mut editor = init_line_editor()?;

    loop {
        // Prompt and read a multi-line submission via editor
        let submission = read_submission_interactive(&mut editor)?;
        if submission.is_none() {
            // EOF or editor closed. End the session cleanly to avoid hanging when stdin is closed
            println!();
            io::stdout().flush()?;
            return Ok(());
        }

        let submission = submission.unwrap();

        let trimmed = submission.trim();
        if trimmed.is_empty() {
            continue; // Ignore empty submissions
        }

        // Anything that is not one of the eight opcodes is a comment to the
        // engine, so a submission with no opcodes would be a silent no-op.
        if !has_instructions(trimmed) {
            continue;
        }

        // Execute the code buffer
        execute_buffer(trimmed);

        // Test hook: if BFI_REPL_ONCE=1, exit after one execution
        if env::var("BFI_REPL_ONCE").ok().as_deref() == Some("1") {
            return Ok(());
        }
    }
}

fn init_line_editor() -> io::Result<reedline::Reedline> {
    use reedline::{
        EditCommand, Emacs, KeyCode, KeyModifiers, Reedline, ReedlineEvent,
        default_emacs_keybindings,
    };

    // Start from default emacs-like bindings and adjust:
    // - Enter -> InsertNewLine (do not submit)
    // - Ctrl+D -> AcceptLine (submit)
    // - Ctrl+Z -> AcceptLine (submit, for Windows)
    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('z'), ReedlineEvent::Submit);

    // Up/down move within the current multiline buffer, not history.
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);

    // Explicit history-mode convenience bindings
    // Alt+Up/Alt+Down or Ctrl+Up/Ctrl+Down to navigate history items.
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Down, ReedlineEvent::NextHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Down, ReedlineEvent::NextHistory);

    let history = reedline::FileBackedHistory::new(1_000).unwrap();

    let editor = Reedline::create()
        .with_highlighter(Box::new(OpcodeHighlighter::new()))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

pub fn read_submission<R: io::BufRead>(stdin: &mut R) -> Option<String> {
    // Collect all lines until EOF
    let mut buffer = String::new();

    loop {
        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => {
                // EOF
                break;
            }
            Ok(_) => {
                buffer.push_str(&line);
            }
            Err(_) => {
                // Read error, ignore
                return None;
            }
        }
    }

    if buffer.is_empty() { None } else { Some(buffer) }
}

fn read_submission_interactive(editor: &mut reedline::Reedline) -> io::Result<Option<String>> {
    // Minimal prompt
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("bfi".to_string()),
        DefaultPromptSegment::Empty,
    );

    // Render prompt and read until user submits with Ctrl+D or Ctrl+Z
    // Enter inserts a newline; history is in-memory and not browsed
    let res = editor.read_line(&prompt);

    match res {
        Ok(Signal::Success(buffer)) => {
            // Add one history item per submitted buffer (program-level)
            if !buffer.trim().is_empty() {
                let _ = editor
                    .history_mut()
                    .save(HistoryItem::from_command_line(buffer.clone()));
            }
            Ok(Some(buffer))
        }
        Ok(Signal::CtrlC) => Ok(None), // Global SIGINT, exit immediately
        Ok(Signal::CtrlD) => Ok(None), // EOF, exit cleanly
        Err(e) => {
            // Print concise error and end session
            eprintln!("repl: editor error: {e}");
            let _ = io::stderr().flush();
            Ok(None)
        }
    }
}

/// Does the buffer contain at least one recognized opcode?
fn has_instructions(s: &str) -> bool {
    s.chars()
        .any(|c| matches!(c, '>' | '<' | '+' | '-' | '.' | ',' | '[' | ']'))
}

/// Executes a single program contained in `code`.
/// - Program output goes to stdout; `,` reads from whatever is on stdin.
/// - Errors are printed concisely to stderr.
/// - A newline is always written to stdout after execution (success or error)
///   so that the prompt begins at column 0 on the next iteration.
/// - Every execution gets a fresh interpreter: fresh tape, empty loop stack.
fn execute_buffer(code: &str) {
    let mut interp = Interpreter::new();
    let result = {
        let mut input = io::stdin().lock();
        let mut output = io::stdout().lock();
        interp.run(code.as_bytes(), &mut input, &mut output)
    };
    if let Err(err) = result {
        cli_util::print_interpreter_error(None, code.as_bytes(), &err);
        let _ = io::stderr().flush();
    }
    println!();
    let _ = io::stdout().flush(); // Ensure output is flushed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    // Flag override
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !io::stdin().is_terminal() {
                return Err(
                    "cannot start editor: stdin is not a TTY (use --bare or BFI_REPL_MODE=bare)"
                        .to_string(),
                );
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    // Environment override
    if let Ok(val) = env::var("BFI_REPL_MODE") {
        let v = val.trim().to_ascii_lowercase();
        return match v.as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" => {
                if !io::stdin().is_terminal() {
                    return Err(
                        "cannot start editor: stdin is not a TTY (use BFI_REPL_MODE=bare)"
                            .to_string(),
                    );
                }
                Ok(ReplMode::Editor)
            }
            _ => Err(format!(
                "invalid BFI_REPL_MODE value: {val}, must be 'bare' or 'editor'"
            )),
        };
    }

    // Auto-detect
    if io::stdin().is_terminal() {
        Ok(ReplMode::Editor)
    } else {
        Ok(ReplMode::Bare)
    }
}

pub fn execute_bare_once() -> io::Result<()> {
    let submission = {
        let mut locked = io::stdin().lock();
        read_submission(&mut locked)
    };
    if let Some(s) = submission {
        let trimmed = s.trim();
        if !trimmed.is_empty() && has_instructions(trimmed) {
            execute_buffer(trimmed);
        }
    }
    Ok(())
}

/// Per-opcode styling for the line editor.
struct OpcodeHighlighter {
    movement: Style,
    arithmetic: Style,
    output: Style,
    input: Style,
    bracket: Style,
    comment: Style,
}

impl OpcodeHighlighter {
    fn new() -> Self {
        Self {
            movement: Style::new().fg(Color::Cyan).bold(),
            arithmetic: Style::new().fg(Color::Green).bold(),
            output: Style::new().fg(Color::Yellow).bold(),
            input: Style::new().fg(Color::LightMagenta).bold(),
            bracket: Style::new().fg(Color::Purple).bold(),
            comment: Style::new().fg(Color::DarkGray),
        }
    }

    #[inline]
    fn style_for(&self, ch: char) -> Style {
        match ch {
            '>' | '<' => self.movement,
            '+' | '-' => self.arithmetic,
            '.' => self.output,
            ',' => self.input,
            '[' | ']' => self.bracket,
            _ => self.comment,
        }
    }
}

impl Highlighter for OpcodeHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut out: StyledText = StyledText::new();
        let mut current_style: Option<Style> = None;
        let mut buffer = String::new();

        for ch in line.chars() {
            let style = self.style_for(ch);

            match current_style {
                None => {
                    current_style = Some(style);
                    buffer.push(ch);
                }
                Some(s) if s == style => {
                    buffer.push(ch);
                }
                Some(s) => {
                    out.push((s, std::mem::take(&mut buffer)));
                    current_style = Some(style);
                    buffer.push(ch);
                }
            }
        }

        if let Some(s) = current_style {
            if !buffer.is_empty() {
                out.push((s, buffer));
            }
        }
        out
    }
}
