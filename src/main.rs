mod chat;
mod cli;
mod color;
mod config;
mod dispatch;
mod providers;
mod resolver;
mod utils;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use cli::{link::link_cmd, list::list_cmd, resolve::resolve_cmd, send::send_cmd, ColorMode};
use tracing_subscriber::EnvFilter;

#[derive(
    Parser, Default, Clone, Copy, ValueEnum, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum RequestedColorMode {
    #[default]
    Auto,
    On,
    Off,
}

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(
    about = "Automatic provider and model selection for chat requests",
    version = "0.0.1"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    #[arg(long, default_value_t = RequestedColorMode::default())]
    color: RequestedColorMode,
    /// Read the configuration from this file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Never consult a resolution delegate
    #[arg(long, global = true)]
    no_delegate: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the provider and model a message resolves to
    Resolve(ResolveArgs),
    /// Prepare a message for sending, tagged with its provider and model
    Send(SendArgs),
    /// Prepare a message carried by a deep link
    Link(LinkArgs),
    /// List providers or models
    List(ListArgs),
}

/// Options shared by commands which resolve a message
#[derive(Args, Default)]
pub(crate) struct MessageArgs {
    /// Attach an image (may be repeated)
    #[arg(long = "image", value_name = "PATH")]
    images: Vec<PathBuf>,
    /// Override the active providers, in priority order (may be repeated)
    #[arg(short, long = "provider", value_name = "NAME")]
    providers: Vec<String>,
    /// The message, read from standard input if absent
    message: Option<String>,
}

#[derive(Parser, Default)]
pub(crate) struct ResolveArgs {
    #[command(flatten)]
    message: MessageArgs,
    /// Output the resolution with the specified format
    #[arg(short, long, default_value_t = ListingFormat::default())]
    format: ListingFormat,
}

#[derive(Parser, Default)]
pub(crate) struct SendArgs {
    #[command(flatten)]
    message: MessageArgs,
    /// Select the model: "auto", "<provider>" or "<provider>/<model>"
    #[arg(short, long)]
    model: Option<String>,
    /// Output the prepared message as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
pub(crate) struct LinkArgs {
    /// A URL carrying the message in its "prompt" query parameter
    url: String,
    /// Override the active providers, in priority order (may be repeated)
    #[arg(short, long = "provider", value_name = "NAME")]
    providers: Vec<String>,
    /// Output the prepared message as JSON
    #[arg(long)]
    json: bool,
}

/// Possible listings
#[derive(Subcommand)]
pub(crate) enum ListObject {
    /// Recognized and configured providers
    Providers,
    /// Models chosen by the built-in resolver
    Models,
}

/// Output formats
#[derive(
    Parser, ValueEnum, Default, Clone, Copy, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum ListingFormat {
    /// Format the output as a table
    #[default]
    Table,
    /// Format the output as JSON
    Json,
    /// Format the output as a table without a header
    HeaderlessTable,
}

#[derive(Parser)]
pub(crate) struct ListArgs {
    /// Output the listing with the specified format
    #[arg(short, long, default_value_t = ListingFormat::default())]
    format: ListingFormat,
    /// List the specified object
    #[command(subcommand)]
    object: ListObject,
}

/// Options common to every command
pub(crate) struct GlobalArgs {
    config: Option<PathBuf>,
    no_delegate: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let color = ColorMode::resolve_auto(cli.color);
    color::configure_color(color);

    let global = GlobalArgs {
        config: cli.config,
        no_delegate: cli.no_delegate,
    };

    match &cli.command {
        Some(Commands::Resolve(args)) => resolve_cmd(&global, args).await,
        Some(Commands::Send(args)) => send_cmd(&global, args).await,
        Some(Commands::Link(args)) => link_cmd(&global, args).await,
        Some(Commands::List(args)) => list_cmd(&global, args),
        None => send_cmd(&global, &SendArgs::default()).await,
    }
}
