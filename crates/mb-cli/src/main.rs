use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mb_cli::commands::{cleanup, dates, edit, event, history, status, stopwatch};
use mb_cli::{App, Cli, Commands};
use mb_core::SystemMonotonicClock;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let mut app = App::open(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Status => status::run(&mut out, &app)?,
        Commands::Stopwatch => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("failed to start runtime")?;
            runtime.block_on(async {
                let input = tokio::io::BufReader::new(tokio::io::stdin());
                stopwatch::run(input, &mut out, &mut app, SystemMonotonicClock::new()).await
            })?;
        }
        Commands::Event { note } => event::run(&mut out, &mut app, note)?,
        Commands::History(args) => history::run(&mut out, &app, args)?,
        Commands::Dates { kind } => dates::run(&mut out, &app.db, *kind)?,
        Commands::Rename { session_id, title } => {
            edit::rename(&mut out, &mut app.db, session_id, title)?;
        }
        Commands::Note { record_id, text } => edit::note(&mut out, &mut app.db, record_id, text)?,
        Commands::DeleteSession { session_id } => {
            edit::delete_session(&mut out, &mut app.db, session_id)?;
        }
        Commands::DeleteRecord { record_id } => {
            edit::delete_record(&mut out, &mut app.db, record_id)?;
        }
        Commands::Cleanup => cleanup::run(&mut out, &mut app)?,
    }

    out.flush()?;
    Ok(())
}
