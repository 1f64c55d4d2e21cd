//! Terminal output formatting.

use colored::Colorize;

use crate::detector::ErrorContext;
use crate::dispatch::FixResult;

/// Welcome lines, one of which opens a monitoring session
const WELCOME_MESSAGES: &[&str] = &[
    "Watching for errors. Run your command as usual.",
    "Error hunter on duty. No traceback shall pass unnoticed.",
    "Monitoring activated. Your output is in good hands.",
    "Keeping an eye on those pesky errors for you.",
];

/// Print the session banner (suppressed by --quiet)
pub fn print_banner(command: &str) {
    // Vary the greeting without pulling in a randomness dependency
    let message = WELCOME_MESSAGES[std::process::id() as usize % WELCOME_MESSAGES.len()];
    eprintln!();
    eprintln!("{} {}", "●".green(), message.green().bold());
    eprintln!("  {} {}", "Running:".blue().bold(), command);
    eprintln!();
}

/// Render markdown-ish text to the terminal with colored output
pub fn render_markdown(text: &str, width: usize, indent: &str) {
    let mut in_code_block = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }

        if in_code_block {
            println!("{indent}  {}", line.cyan());
            continue;
        }

        let processed = render_inline_markdown(line);
        for wrapped_line in textwrap::wrap(&processed, width.saturating_sub(indent.len())) {
            println!("{indent}{wrapped_line}");
        }
    }
}

/// Process inline markdown: `code`, **bold**, *italic*
pub fn render_inline_markdown(text: &str) -> String {
    let mut result = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '`' {
            let mut code = String::new();
            while let Some(&next) = chars.peek() {
                if next == '`' {
                    chars.next();
                    break;
                }
                code.push(chars.next().unwrap());
            }
            result.push_str(&code.cyan().to_string());
        } else if c == '*' {
            if chars.peek() == Some(&'*') {
                chars.next();
                let mut bold_text = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '*' {
                        chars.next();
                        if chars.peek() == Some(&'*') {
                            chars.next();
                        }
                        break;
                    }
                    bold_text.push(chars.next().unwrap());
                }
                result.push_str(&bold_text.bold().to_string());
            } else {
                let mut italic_text = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '*' {
                        chars.next();
                        break;
                    }
                    italic_text.push(chars.next().unwrap());
                }
                result.push_str(&italic_text.italic().to_string());
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Print a successful fix suggestion
pub fn print_fix(context: &ErrorContext, result: &FixResult) {
    let width = textwrap::termwidth().min(100);
    let fix = result.fix.as_deref().unwrap_or_default();

    println!();
    println!("{} {}", "●".red(), context.line.bold());
    println!();
    if result.cached {
        println!(
            "{} {} {}",
            "▸".green(),
            "Suggested fix".green().bold(),
            "(cached)".dimmed()
        );
    } else {
        println!("{} {}", "▸".green(), "Suggested fix".green().bold());
    }
    render_markdown(fix, width, "  ");
    println!();
}

/// Print a failed dispatch; monitoring continues afterward
pub fn print_failure(context: &ErrorContext, reason: &str) {
    println!();
    println!("{} {}", "●".red(), context.line.bold());
    println!();
    println!(
        "{} {} {}",
        "✗".red(),
        "Could not get a fix:".red().bold(),
        reason
    );
    println!("  {}", "Monitoring continues.".dimmed());
    println!();
}

/// Print the dispatch outcome as a JSON object (for --json)
pub fn print_json(context: &ErrorContext, result: &FixResult) {
    let payload = serde_json::json!({
        "language": context.language,
        "label": context.label,
        "error": context.line,
        "context": context.preceding,
        "fix": result.fix,
        "cached": result.cached,
        "failure": result.failure,
    });
    match serde_json::to_string_pretty(&payload) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => eprintln!("failed to render JSON output: {err}"),
    }
}

/// Print the child's exit status (suppressed by --quiet)
pub fn print_exit_status(code: i32) {
    if code == 0 {
        eprintln!("{} {}", "✓".green(), "Command finished cleanly".green());
    } else {
        eprintln!(
            "{} {} {}",
            "✗".red(),
            format!("Command exited with code {code}").red(),
            format!("({})", interpret_exit_code(code)).dimmed()
        );
    }
}

/// Interpret exit codes with human-readable descriptions
pub fn interpret_exit_code(code: i32) -> &'static str {
    match code {
        0 => "success",
        1 => "general error",
        2 => "misuse of shell command",
        126 => "command cannot execute (permission denied)",
        127 => "command not found",
        128 => "invalid exit argument",
        130 => "terminated by Ctrl+C (SIGINT)",
        137 => "killed (SIGKILL)",
        139 => "segmentation fault (SIGSEGV)",
        141 => "broken pipe (SIGPIPE)",
        143 => "terminated (SIGTERM)",
        _ if code > 128 && code < 165 => "terminated by signal",
        _ => "unknown",
    }
}
