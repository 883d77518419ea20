use std::fs;
use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::Env;
use log::info;

use subconv::utils::HttpFetcher;
use subconv::{Settings, Subconverter};

/// Convert proxy subscriptions into client configuration documents
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (TOML or YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Listen address (e.g., 127.0.0.1 or 0.0.0.0)
    #[arg(short, long, value_name = "ADDRESS")]
    address: Option<String>,

    /// Listen port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Subscription URL(s), `|`-separated, to convert instead of starting the server
    #[arg(long, value_name = "URL", conflicts_with = "input")]
    url: Option<String>,

    /// Local subscription file to convert instead of starting the server
    #[arg(long, value_name = "FILE")]
    input: Option<String>,

    /// Target client; defaults to the configured default target
    #[arg(short, long, value_name = "TARGET")]
    target: Option<String>,

    /// Write the generated document here instead of stdout
    #[arg(short, long, value_name = "OUTPUT_FILE")]
    output: Option<String>,

    /// Print the supported targets and exit
    #[arg(long)]
    list_targets: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref().unwrap_or_default())
        .context("failed to load configuration")?;
    env_logger::init_from_env(Env::default().default_filter_or(settings.log_level.as_str()));

    if let Some(address) = args.address {
        settings.listen_address = address;
    }
    if let Some(port) = args.port {
        settings.listen_port = port;
    }

    let subconverter = Subconverter::with_defaults(settings.strict)?;

    if args.list_targets {
        for target in subconverter.supported_targets() {
            println!("{}", target);
        }
        return Ok(());
    }

    if args.url.is_none() && args.input.is_none() {
        if args.output.is_some() {
            bail!("--output requires --url or --input");
        }
        return serve(settings, subconverter);
    }

    let options = settings.base_options(args.target.as_deref().unwrap_or_default());
    let document = if let Some(url) = args.url.as_deref() {
        info!("Converting subscription {} to {}", url, options.target);
        let fetcher = HttpFetcher::new(&settings.user_agent)?;
        let timeout = Duration::from_secs(settings.fetch_timeout_secs);
        subconverter.convert_url(&fetcher, url, timeout, &options)?
    } else {
        let path = args.input.as_deref().unwrap_or_default();
        info!("Converting subscription file {} to {}", path, options.target);
        let body = fs::read(path).with_context(|| format!("failed to read {}", path))?;
        subconverter.convert_content(&body, &options)?
    };

    match args.output {
        Some(path) => {
            fs::write(&path, &document).with_context(|| format!("failed to write {}", path))?;
            info!("Wrote {} bytes to {}", document.len(), path);
        }
        None => std::io::stdout().write_all(&document)?,
    }
    Ok(())
}

#[cfg(feature = "web-api")]
fn serve(settings: Settings, subconverter: Subconverter) -> anyhow::Result<()> {
    use std::sync::Arc;

    use subconv::rulesets::ConfiguredRulesets;
    use subconv::web_handlers::{run_server, AppState};

    let fetcher = Arc::new(HttpFetcher::new(&settings.user_agent)?);
    let rulesets = Arc::new(ConfiguredRulesets::new(
        settings.rulesets.clone(),
        fetcher.clone(),
        Duration::from_secs(settings.fetch_timeout_secs),
    ));
    let state = AppState {
        settings,
        subconverter,
        fetcher,
        rulesets,
    };
    actix_web::rt::System::new().block_on(run_server(state))?;
    Ok(())
}

#[cfg(not(feature = "web-api"))]
fn serve(_settings: Settings, _subconverter: Subconverter) -> anyhow::Result<()> {
    bail!("built without the web-api feature; pass --url or --input to convert directly")
}
