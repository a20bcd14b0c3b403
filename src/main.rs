mod cli;
mod core;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::report_cmd::ReportRequest;
use crate::core::auth::CredentialArgs;

#[derive(Parser)]
#[command(
    name = "costreport",
    about = "AWS cost and usage reporting CLI",
    version,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    report: ReportArgs,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct ReportArgs {
    /// Profile name in the shared credentials file
    #[arg(short, long)]
    profile: Option<String>,

    /// AWS access key id
    #[arg(short, long)]
    access_key: Option<String>,

    /// AWS secret access key
    #[arg(short, long)]
    secret_key: Option<String>,

    /// Comma-separated regions (default: all built-in regions). Cost Explorer
    /// totals are account-wide, so each listed region repeats them
    #[arg(short, long)]
    regions: Option<String>,

    /// Time range as YYYY-MM-DD,YYYY-MM-DD
    #[arg(short, long)]
    timerange: Option<String>,

    /// Print records as JSON
    #[arg(short, long)]
    json: bool,

    /// Print records as CSV
    #[arg(short, long)]
    csv: bool,

    /// Comma-separated dimensions to group by
    #[arg(short, long, default_value = "")]
    dimension: String,

    /// Comma-separated cost allocation tags to group by
    #[arg(short = 'g', long, default_value = "")]
    tag: String,

    /// Granularity: MONTHLY or DAILY
    #[arg(short, long)]
    interval: Option<String>,

    /// Abbreviate service names in the summary
    #[arg(short = 'b', long)]
    abbreviate: bool,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file
    Check,
    /// Print the config file location
    Path,
}

impl From<ReportArgs> for ReportRequest {
    fn from(args: ReportArgs) -> Self {
        ReportRequest {
            credentials: CredentialArgs {
                profile: args.profile,
                access_key: args.access_key,
                secret_key: args.secret_key,
            },
            regions: args.regions,
            timerange: args.timerange,
            json: args.json,
            csv: args.csv,
            dimension: args.dimension,
            tag: args.tag,
            interval: args.interval,
            abbreviate: args.abbreviate,
            color: !args.no_color,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("costreport=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("costreport=warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        None => cli::report_cmd::run(cli.report.into()).await?,
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init => cli::config_cmd::init()?,
            ConfigAction::Check => cli::config_cmd::check()?,
            ConfigAction::Path => cli::config_cmd::path()?,
        },
    }

    Ok(())
}
