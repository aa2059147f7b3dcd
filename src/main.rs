use bfi::repl::{self, ModeFlagOverride, ReplMode};
use bfi::{DEFAULT_OP_LIMIT, Interpreter, Submission, cli_util};
use clap::{Args, Parser, Subcommand};
use std::env;
use std::fs;
use std::io::{self, Cursor, Write};

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run  [--max-ops N|--no-limit]          # Execute a submission read from stdin
  {0} run  [--max-ops N|--no-limit] --file <PATH>  # Execute a submission loaded from file
  {0} eval [--max-ops N|--no-limit] "<code>" # Execute raw code (args are concatenated)
  {0} eval [--max-ops N|--no-limit] --file <PATH>  # Execute raw code loaded from file
  {0} repl                                   # Start an interactive session

A submission is: a header line with the input byte count and the code line
count, the program input terminated by '$', then that many lines of code.

Run "{0} <subcommand> --help" for more info.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

fn run_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [--max-ops N|--no-limit]
  {0} run [--max-ops N|--no-limit] --file <PATH>

Options:
  --file,    -f <PATH>  Read the submission from PATH instead of stdin
  --max-ops <N>   Abort after N dispatched instructions (fallback BFI_MAX_OPS; default {1})
  --no-limit      Disable the operation ceiling
  --help,    -h   Show this help

Notes:
- The submission format is: "<input bytes> <code lines>" on a header line,
  the program input terminated by '$', then exactly that many code lines.
- Both declared counts are validated against what was actually read.
- The input blob feeds the program's ',' instruction; when it runs dry the
  current cell is left unchanged.

Example:
    printf '2 1\nhi$\n,.,.\n' | {0} run
"#,
        program,
        DEFAULT_OP_LIMIT
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

fn eval_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} eval [--max-ops N|--no-limit] "<code>"
  {0} eval [--max-ops N|--no-limit] --file <PATH>

Options:
  --file,    -f <PATH>  Read code from PATH instead of positional "<code>"
  --max-ops <N>   Abort after N dispatched instructions (fallback BFI_MAX_OPS; default {1})
  --no-limit      Disable the operation ceiling
  --help,    -h   Show this help

Notes:
- Input (`,`) reads a single byte from stdin; when stdin is exhausted the
  current cell is left unchanged.
- Any byte outside of ><+-.,[] is a comment and is skipped for free.

Examples:
- Load code from a file:
    {0} eval --file ./program.bf
- Read bytes from a file as stdin (`,` will consume file input):
    {0} eval ",[.,]" < input.txt
"#,
        program,
        DEFAULT_OP_LIMIT
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

fn repl_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} repl [--bare|--editor]   # Start an interactive session

Options:
  --bare        Force non-interactive bare mode (read stdin to EOF, run once)
  --editor      Force interactive mode (errors if stdin is not a TTY)
  --help,  -h   Show this help

Notes:
    - Ctrl+d executes the current buffer on *nix/macOS.
    - Ctrl+z and Enter will execute the current buffer on Windows.
    - Ctrl+c exits the session immediately.
    - Each execution starts with a fresh tape and an empty loop stack.
    - Mode defaults to BFI_REPL_MODE, then TTY auto-detection.
    - The session will exit after a single execution if the environment
      variable BFI_REPL_ONCE is set to 1.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bfi", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(RunArgs),
    Eval(EvalArgs),
    Repl(ReplArgs),
}

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
struct RunArgs {
    /// Read the submission from PATH instead of stdin
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// Maximum dispatched instructions before abort (fallback BFI_MAX_OPS)
    #[arg(long = "max-ops", value_name = "N", conflicts_with = "no_limit")]
    max_ops: Option<u64>,

    /// Disable the operation ceiling
    #[arg(long = "no-limit")]
    no_limit: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,
}

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
struct EvalArgs {
    /// Read code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// Maximum dispatched instructions before abort (fallback BFI_MAX_OPS)
    #[arg(long = "max-ops", value_name = "N", conflicts_with = "no_limit")]
    max_ops: Option<u64>,

    /// Disable the operation ceiling
    #[arg(long = "no-limit")]
    no_limit: bool,

    /// Concatenated code parts. Hyphens are legal code, not flags.
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,
}

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
struct ReplArgs {
    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor")]
    bare: bool,

    /// Force interactive mode (errors if stdin is not a TTY)
    #[arg(long = "editor", conflicts_with = "bare")]
    editor: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,
}

/// Resolve the operation ceiling: flag -> BFI_MAX_OPS -> default.
fn resolve_op_limit(max_ops: Option<u64>, no_limit: bool) -> Option<u64> {
    if no_limit {
        return None;
    }
    let limit = max_ops
        .or_else(|| {
            env::var("BFI_MAX_OPS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
        })
        .unwrap_or(DEFAULT_OP_LIMIT);
    Some(limit)
}

fn run_run_with_args(program: &str, args: RunArgs) -> i32 {
    if args.help {
        run_usage_and_exit(program, 0);
    }

    let RunArgs {
        file,
        max_ops,
        no_limit,
        ..
    } = args;

    let submission = match file {
        Some(path) => {
            let handle = match fs::File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("{program}: failed to open submission file: {e}");
                    let _ = io::stderr().flush();
                    return 1;
                }
            };
            Submission::read_from(&mut io::BufReader::new(handle))
        }
        None => Submission::read_from(&mut io::stdin().lock()),
    };

    let submission = match submission {
        Ok(s) => s,
        Err(err) => {
            cli_util::print_submission_error(Some(program), &err);
            return 1;
        }
    };

    let mut interp = Interpreter::with_op_limit(resolve_op_limit(max_ops, no_limit));
    let result = {
        let mut input = Cursor::new(submission.input);
        let mut output = io::stdout().lock();
        interp.run(submission.code.as_bytes(), &mut input, &mut output)
    };

    if let Err(err) = result {
        cli_util::print_interpreter_error(Some(program), submission.code.as_bytes(), &err);
        let _ = io::stderr().flush();
        return 1;
    }

    // For readability, ensure output ends with a newline
    println!();
    let _ = io::stdout().flush();
    0
}

fn run_eval_with_args(program: &str, args: EvalArgs) -> i32 {
    if args.help {
        eval_usage_and_exit(program, 0);
    }

    let EvalArgs {
        file,
        max_ops,
        no_limit,
        code,
        ..
    } = args;

    if file.is_none() && code.is_empty() {
        eval_usage_and_exit(program, 2);
    }

    if file.is_some() && !code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        eval_usage_and_exit(program, 2);
    }

    let code_str = if let Some(path) = file {
        match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{program}: failed to read code file as UTF-8: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
        }
    } else {
        code.join("")
    };

    let mut interp = Interpreter::with_op_limit(resolve_op_limit(max_ops, no_limit));
    let result = {
        let mut input = io::stdin().lock();
        let mut output = io::stdout().lock();
        interp.run(code_str.as_bytes(), &mut input, &mut output)
    };

    if let Err(err) = result {
        cli_util::print_interpreter_error(Some(program), code_str.as_bytes(), &err);
        let _ = io::stderr().flush();
        return 1;
    }

    // For readability, ensure output ends with a newline
    println!();
    let _ = io::stdout().flush();
    0
}

fn run_repl_with_args(program: &str, args: ReplArgs) -> i32 {
    if args.help {
        repl_usage_and_exit(program, 0);
    }

    let mode_flag = if args.bare {
        ModeFlagOverride::Bare
    } else if args.editor {
        ModeFlagOverride::Editor
    } else {
        ModeFlagOverride::None
    };

    // Determine mode: flags -> env -> auto-detect via is_terminal()
    let mode = match repl::select_mode(mode_flag) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    // Install SIGINT (ctrl+c) handler to flush and exit(0) immediately
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(0);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    match mode {
        ReplMode::Bare => {
            if repl::execute_bare_once().is_err() {
                return 1;
            }
            0
        }
        ReplMode::Editor => {
            println!("bfi interactive session");
            println!(
                "Ctrl+d/Ctrl+z Enter (Windows) executes the current buffer. Press ctrl+c to exit"
            );

            if repl::repl_loop().is_err() {
                return 1;
            }
            0
        }
    }
}

fn main() {
    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bfi"));

    let cli = Cli::parse();

    if cli.help || cli.command.is_none() {
        print_top_usage_and_exit(&program, if cli.help { 0 } else { 2 });
    }

    let code = match cli.command.unwrap() {
        Command::Run(args) => run_run_with_args(&program, args),
        Command::Eval(args) => run_eval_with_args(&program, args),
        Command::Repl(args) => run_repl_with_args(&program, args),
    };

    std::process::exit(code);
}
