//! Al-Bayan terminal chat entry point.
//!
//! Binary name: `albayan`
//!
//! Parses CLI arguments, initializes tracing, storage and the answer
//! provider, then dispatches to the command handler. Any error that reaches
//! `main` is logged and reported with a generic localized message.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use console::style;

use cli::{Cli, Commands, UNEXPECTED_ERROR_TEXT};
use state::AppState;

/// Set to `1` to export spans through OpenTelemetry (stdout exporter).
const OTEL_ENV: &str = "ALBAYAN_OTEL";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,albayan=debug",
        _ => "trace",
    };
    let enable_otel = std::env::var(OTEL_ENV).is_ok_and(|v| v == "1");
    if let Err(e) = albayan_observe::tracing_setup::init_tracing(filter, enable_otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = ?e, "Command failed");
            eprintln!("\n  {} {}", style("!").red().bold(), UNEXPECTED_ERROR_TEXT);
            eprintln!("  {}", style(format!("{e:#}")).dim());
            1
        }
    };

    albayan_observe::tracing_setup::shutdown_tracing();
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "albayan", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.ephemeral).await?;
    tracing::debug!(
        data_dir = %state.data_dir.display(),
        model = %state.config.model,
        provider = state.controller.provider_name(),
        "Application state ready"
    );

    match cli.command {
        None => cli::chat::loop_runner::run_chat_loop(&state, None).await?,

        Some(Commands::Chat { session }) => {
            cli::chat::loop_runner::run_chat_loop(&state, session.as_deref()).await?;
        }

        Some(Commands::Ask { text, session }) => {
            let text = text.join(" ");
            cli::ask::ask(&state, &text, session.as_deref(), cli.json, cli.quiet).await?;
        }

        Some(Commands::Sessions) => cli::session::list_sessions(&state, cli.json)?,

        Some(Commands::Show { session }) => cli::session::show_session(&state, &session, cli.json)?,

        Some(Commands::Delete { session, force }) => {
            cli::session::delete_session(&state, &session, force, cli.json).await?;
        }

        // Handled above.
        Some(Commands::Completions { .. }) => {}
    }

    Ok(())
}
