use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cruxview::config::{Config, config_path};
use cruxview::dashboard::{Dashboard, Submission};
use cruxview::models::MetricName;
use cruxview::output::{self, OutputFormat};
use cruxview::sources;
use cruxview::table::SortField;
use cruxview::validate::parse_url_list;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "cruxview",
    version,
    about = "Chrome UX Report dashboard for the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format: table, markdown, json, yaml (default from config)
    #[arg(long, global = true)]
    format: Option<String>,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    /// Base URL of the analysis service (overrides config and CRUXVIEW_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze URLs and render the metrics dashboard
    Analyze {
        /// URLs to analyze; read from --file or stdin when omitted
        urls: Vec<String>,
        /// File with one URL per line
        #[arg(long, short)]
        file: Option<PathBuf>,
        /// Sort column: url, lcp, fcp, cls
        #[arg(long, default_value = "url")]
        sort: String,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Hide rows whose LCP p75 exceeds this many ms
        #[arg(long)]
        max_lcp: Option<String>,
        /// Hide rows whose FCP p75 exceeds this many ms
        #[arg(long)]
        max_fcp: Option<String>,
        /// Hide rows whose CLS p75 exceeds this score
        #[arg(long)]
        max_cls: Option<String>,
        /// Generate metrics locally instead of calling the service
        #[arg(long)]
        offline: bool,
    },
    /// Check a URL list without sending it
    Validate {
        urls: Vec<String>,
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cruxview=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    config.apply_api_url(cli.api_url.clone());

    let format = OutputFormat::from_str(cli.format.as_deref().unwrap_or(&config.output.format))?;
    let color = config.output.color && !cli.no_color && std::io::stdout().is_terminal();

    match cli.command {
        Command::Analyze {
            urls,
            file,
            sort,
            desc,
            max_lcp,
            max_fcp,
            max_cls,
            offline,
        } => {
            let input = read_input(&urls, file.as_deref())?;
            let filters = [
                (MetricName::Lcp, max_lcp),
                (MetricName::Fcp, max_fcp),
                (MetricName::Cls, max_cls),
            ];
            cmd_analyze(&config, format, color, &input, &sort, desc, &filters, offline)
        }
        Command::Validate { urls, file } => {
            let input = read_input(&urls, file.as_deref())?;
            cmd_validate(&input)
        }
        Command::Config => cmd_config(&config),
    }
}

/// Positional URLs win, then `--file`, then stdin.
fn read_input(urls: &[String], file: Option<&std::path::Path>) -> Result<String> {
    if !urls.is_empty() {
        return Ok(urls.join("\n"));
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read URLs from stdin")?;
    Ok(buf)
}

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    config: &Config,
    format: OutputFormat,
    color: bool,
    input: &str,
    sort: &str,
    desc: bool,
    filters: &[(MetricName, Option<String>)],
    offline: bool,
) -> Result<ExitCode> {
    let field: SortField = sort.parse().map_err(anyhow::Error::msg)?;
    let analyzer = sources::analyzer_for(config, offline)?;

    let mut dashboard = Dashboard::new();
    if dashboard.sort.field != field {
        dashboard.sort.set_sort(field);
    }
    if desc {
        dashboard.sort.set_sort(field);
    }
    for (metric, raw) in filters {
        if let Some(raw) = raw {
            dashboard.filters.set_filter(*metric, raw);
        }
    }

    let submission = dashboard.submit(input, analyzer.as_ref());
    println!("{}", output::render(&dashboard.snapshot(), format, color)?);

    Ok(match submission {
        Submission::Completed => ExitCode::SUCCESS,
        Submission::Rejected => ExitCode::from(2),
        Submission::Busy | Submission::Failed => ExitCode::FAILURE,
    })
}

fn cmd_validate(input: &str) -> Result<ExitCode> {
    match parse_url_list(input) {
        Ok(urls) => {
            for url in &urls {
                println!("{url}");
            }
            eprintln!("{} URL(s) valid", urls.len());
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{err}");
            if let cruxview::error::ValidationError::Invalid { rejected } = &err {
                for url in rejected {
                    eprintln!("  rejected: {url}");
                }
            }
            Ok(ExitCode::from(2))
        }
    }
}

fn cmd_config(config: &Config) -> Result<ExitCode> {
    println!("# {}", config_path().display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(ExitCode::SUCCESS)
}
