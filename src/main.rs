use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;

use watchit::cache::ResponseCache;
use watchit::cli::Cli;
use watchit::config::CredentialSpec;
use watchit::detector::Detector;
use watchit::dispatch::{Dispatcher, ProviderSource};
use watchit::gate::{AutoGate, TerminalGate};
use watchit::monitor::{Monitor, MonitorOptions};
use watchit::output;
use watchit::patterns::SignatureCatalog;
use watchit::providers::create_provider;
use watchit::runner::ProcessRunner;

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

fn build_cache(cli: &Cli) -> Result<ResponseCache> {
    if cli.no_cache {
        return Ok(ResponseCache::new(0));
    }
    match &cli.cache_file {
        Some(path) => ResponseCache::with_file(cli.cache_capacity, path),
        None => Ok(ResponseCache::new(cli.cache_capacity)),
    }
}

fn build_dispatcher(cli: &Cli, cache: ResponseCache) -> Dispatcher {
    // A fully specified provider skips lazy resolution entirely
    let source = match (cli.provider, cli.api_key.clone()) {
        (Some(provider), Some(api_key)) => {
            ProviderSource::Ready(create_provider(provider, api_key))
        }
        (provider, api_key) => ProviderSource::Lazy(CredentialSpec { provider, api_key }),
    };
    Dispatcher::new(cache, source)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        print_completions(shell);
        return Ok(());
    }

    let command = cli.command_line();

    let runner = match ProcessRunner::spawn(&command) {
        Ok(runner) => runner,
        Err(err) => {
            eprintln!("{} {}", "✗".red(), err.to_string().red().bold());
            std::process::exit(err.exit_code());
        }
    };

    if !cli.quiet {
        output::print_banner(&command);
    }

    let cache = build_cache(&cli)?;
    let dispatcher = build_dispatcher(&cli, cache);
    let detector = Detector::new(SignatureCatalog::with_builtins(), cli.context_lines);
    let options = MonitorOptions { json: cli.json };

    // The gate implementations differ in type, so each arm runs its own monitor
    let code = if cli.auto {
        Monitor::new(detector, AutoGate, dispatcher, options)
            .run(runner)
            .await?
    } else {
        Monitor::new(detector, TerminalGate, dispatcher, options)
            .run(runner)
            .await?
    };

    if !cli.quiet {
        output::print_exit_status(code);
    }

    // The tool's exit code is always the child's
    std::process::exit(code);
}
