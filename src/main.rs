// Entrypoint for the CLI application.
// - Keeps `main` small: load settings, set up logging and hand the parsed
//   command to `commands::run`.
// - Errors surface here once, as a red line on stderr and an exit code
//   scripts can branch on (3 = log in again, 4 = pick a context).

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kidsview_cli::cli::Cli;
use kidsview_cli::config::Settings;
use kidsview_cli::error::{Error, EXIT_FAILURE};
use kidsview_cli::{commands, ui};

fn main() {
    // A missing .env is the normal case.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let debug = cli.debug;

    let code = match run(cli) {
        Ok(()) => 0,
        Err(err) => report(&err, debug),
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::from_env()
        .context("invalid KIDSVIEW_* environment")?
        .with_debug(cli.debug);
    init_logging(settings.debug);
    tracing::debug!(api = %settings.api_url, config_dir = %settings.config_dir.display(), "starting");

    commands::run(cli, settings)?;
    Ok(())
}

/// Logs go to stderr. `RUST_LOG` wins; otherwise warnings only, or debug
/// output for this crate when debugging is on.
fn init_logging(debug: bool) {
    let default = if debug { "warn,kidsview_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn report(err: &anyhow::Error, debug: bool) -> i32 {
    // `{:#}` prints the whole cause chain on one line.
    ui::error(&format!("{err:#}"));
    let source = err.chain().find_map(|cause| cause.downcast_ref::<Error>());
    if debug {
        if let Some(Error::GraphQL {
            data: Some(data), ..
        }) = source
        {
            eprintln!("partial data: {data}");
        }
    }
    source.map_or(EXIT_FAILURE, Error::exit_code)
}
