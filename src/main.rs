// Entrypoint for the CLI application.
// - Parses flags, loads settings and sets up logging on stderr.
// - Hands a validated client to the interactive loop and closes it at the end.

use std::ffi::OsString;
use std::io::IsTerminal;

use anyhow::Context;
use clap::Parser;
use tmdb_cli::{App, Settings};
use tracing_subscriber::EnvFilter;

/// Token embedded at build time, used when none is configured.
const BUILD_TOKEN: Option<&str> = option_env!("TMDB_TOKEN");

/// Browse movie lists from the command line.
#[derive(Parser, Debug)]
#[command(name = "tmdb", version, about)]
struct Args {
    /// Page number
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    page: i64,

    /// The type of list [playing,popular,top,upcoming]
    #[arg(short = 't', long = "type")]
    kind: Option<String>,
}

/// Accept the single-dash long flags (`-page 2`, `-type=top`) as well.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(s) if is_single_dash_long(s, "page") || is_single_dash_long(s, "type") => {
                OsString::from(format!("-{s}"))
            }
            _ => arg,
        })
        .collect()
}

fn is_single_dash_long(arg: &str, name: &str) -> bool {
    arg.strip_prefix('-')
        .and_then(|rest| rest.strip_prefix(name))
        .is_some_and(|tail| tail.is_empty() || tail.starts_with('='))
}

fn init_logging(debug: bool) {
    let default = if debug { "tmdb_cli=debug,tmdb=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse_from(normalize_args(std::env::args_os()));

    let mut settings = Settings::load().context("cannot load settings")?;
    if settings.client.token.is_empty() {
        if let Some(token) = BUILD_TOKEN {
            settings.set_token(token);
        }
    }
    init_logging(settings.debug);
    tracing::debug!(?args, "starting");

    let mut app = App::new(settings)
        .context("cannot start application")?
        .with_spinner(std::io::stderr().is_terminal());
    app.run(args.page, args.kind.as_deref().unwrap_or_default());
    app.close().context("cannot close application")?;
    Ok(())
}
