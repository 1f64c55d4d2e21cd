//! Command-line interface definitions for the `watchit` tool.

use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

use crate::detector::DEFAULT_CONTEXT_LINES;
use crate::providers::ProviderType;

/// Run a command, catch its errors, ask an AI how to fix them
#[derive(Parser, Debug)]
#[command(name = "watchit", version, about, long_about = None)]
#[command(
    after_help = "EXAMPLES:\n    watchit \"python manage.py migrate\"\n    watchit --provider groq \"npm run build\"\n    watchit --auto --json \"node server.js\""
)]
pub struct Cli {
    /// Command to run and monitor
    #[arg(trailing_var_arg = true, required_unless_present = "completions")]
    pub command: Vec<String>,

    /// AI provider to use for fix suggestions
    #[arg(long, short = 'p', value_enum, value_name = "PROVIDER")]
    pub provider: Option<ProviderType>,

    /// API key for the selected provider
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Request fixes without prompting for confirmation
    #[arg(long)]
    pub auto: bool,

    /// Print dispatch results as JSON
    #[arg(long, short = 'j')]
    pub json: bool,

    /// Quiet mode - no banner or exit status summary
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Number of preceding lines captured with each error
    #[arg(long, default_value_t = DEFAULT_CONTEXT_LINES, value_name = "N")]
    pub context_lines: usize,

    /// Persist the fix cache to this file (off by default)
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Maximum number of cached fixes
    #[arg(long, default_value_t = crate::cache::DEFAULT_CAPACITY, value_name = "N")]
    pub cache_capacity: usize,

    /// Disable the fix cache entirely
    #[arg(long, conflicts_with = "cache_file")]
    pub no_cache: bool,

    /// Generate shell completions
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// The command words joined into the line handed to `/bin/sh -c`
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parses_command_words() {
        let cli = Cli::parse_from(["watchit", "python", "manage.py", "migrate"]);
        assert_eq!(cli.command, vec!["python", "manage.py", "migrate"]);
        assert_eq!(cli.command_line(), "python manage.py migrate");
    }

    #[test]
    fn test_cli_parses_quoted_command() {
        let cli = Cli::parse_from(["watchit", "npm run build"]);
        assert_eq!(cli.command.len(), 1);
        assert_eq!(cli.command_line(), "npm run build");
    }

    #[test]
    fn test_cli_requires_a_command() {
        assert!(Cli::try_parse_from(["watchit"]).is_err());
    }

    #[test]
    fn test_cli_parses_provider_flag() {
        let cli = Cli::parse_from(["watchit", "--provider", "groq", "ls"]);
        assert_eq!(cli.provider, Some(ProviderType::Groq));
    }

    #[test]
    fn test_cli_parses_short_provider_flag() {
        let cli = Cli::parse_from(["watchit", "-p", "gemini", "ls"]);
        assert_eq!(cli.provider, Some(ProviderType::Gemini));
    }

    #[test]
    fn test_cli_parses_api_key() {
        let cli = Cli::parse_from(["watchit", "--api-key", "sk-test", "ls"]);
        assert_eq!(cli.api_key, Some("sk-test".to_string()));
    }

    #[test]
    fn test_cli_parses_auto_flag() {
        let cli = Cli::parse_from(["watchit", "--auto", "ls"]);
        assert!(cli.auto);
    }

    #[test]
    fn test_cli_parses_json_flag() {
        let cli = Cli::parse_from(["watchit", "-j", "ls"]);
        assert!(cli.json);
    }

    #[test]
    fn test_cli_context_lines_default() {
        let cli = Cli::parse_from(["watchit", "ls"]);
        assert_eq!(cli.context_lines, DEFAULT_CONTEXT_LINES);
    }

    #[test]
    fn test_cli_parses_cache_file() {
        let cli = Cli::parse_from(["watchit", "--cache-file", "/tmp/fixes.json", "ls"]);
        assert_eq!(cli.cache_file, Some(PathBuf::from("/tmp/fixes.json")));
    }

    #[test]
    fn test_cli_no_cache_conflicts_with_cache_file() {
        assert!(
            Cli::try_parse_from(["watchit", "--no-cache", "--cache-file", "/tmp/x", "ls"]).is_err()
        );
    }

    #[test]
    fn test_cli_parses_completions_without_command() {
        let cli = Cli::parse_from(["watchit", "--completions", "bash"]);
        assert_eq!(cli.completions, Some(Shell::Bash));
        assert!(cli.command.is_empty());
    }

    #[test]
    fn test_cli_flags_before_command() {
        let cli = Cli::parse_from(["watchit", "--auto", "-q", "python", "app.py"]);
        assert!(cli.auto);
        assert!(cli.quiet);
        assert_eq!(cli.command_line(), "python app.py");
    }
}
