use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use containers_resolver::{FsImagesExtractor, Resolver, ResolverConfig, SyftAnalyzer};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "containers-resolver")]
#[command(about = "Resolve the container images of a project into packages and layers", long_about = None)]
#[command(subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory or tar archive (.tar, .tar.gz, .tgz) to scan for manifests
    #[arg(long, env = "CONTAINERS_RESOLVER_SCAN_PATH", required = true)]
    scan_path: Option<PathBuf>,

    /// Existing directory the resolution is written into
    #[arg(long, env = "CONTAINERS_RESOLVER_RESOLUTION_FOLDER", required = true)]
    resolution_folder: Option<PathBuf>,

    /// Image to analyze in addition to the discovered ones (repeatable, comma separated)
    #[arg(
        long = "image",
        env = "CONTAINERS_RESOLVER_IMAGES",
        value_delimiter = ','
    )]
    images: Vec<String>,

    /// Platform to analyze images for (default: linux/amd64)
    #[arg(long, env = "CONTAINERS_RESOLVER_PLATFORM", conflicts_with = "no_platform")]
    platform: Option<String>,

    /// Analyze images for the host platform
    #[arg(long)]
    no_platform: bool,

    /// Keep the results directory after the resolution
    #[arg(long, env = "CONTAINERS_RESOLVER_KEEP_RESULTS")]
    keep_results: bool,

    /// syft executable
    #[arg(long = "syft", env = "CONTAINERS_RESOLVER_SYFT")]
    syft_binary: Option<PathBuf>,

    /// Config file (default: $CONTAINERS_RESOLVER_CONFIG, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose pipeline logs
    #[arg(long, env = "CONTAINERS_RESOLVER_DEBUG")]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Version)) {
        println!("containers-resolver {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    let scan_path = cli.scan_path.context("--scan-path is required")?;
    let resolution_folder = cli
        .resolution_folder
        .context("--resolution-folder is required")?;

    let analyzer = SyftAnalyzer::new(config.syft_binary.clone());
    let resolver = Resolver::new(FsImagesExtractor::new(), analyzer).with_config(config);

    println!("{}", "Resolving container images...".green());
    println!("  scan path: {}", scan_path.display().to_string().cyan());
    if !cli.images.is_empty() {
        println!("  images: {}", cli.images.join(", ").cyan());
    }

    match resolver
        .resolve(&scan_path, &resolution_folder, &cli.images, cli.debug)
        .await
    {
        Ok(()) => {
            println!("{}", "✓ Resolution completed".green().bold());
            if resolver.config().keep_results {
                let results = resolution_folder.join(&resolver.config().results_dir);
                println!("  results: {}", results.display().to_string().cyan());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗ Resolution failed:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let filter = if debug {
        filter.add_directive(tracing::Level::DEBUG.into())
    } else {
        filter
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

/// Config file values, overridden by command line flags
fn load_config(cli: &Cli) -> anyhow::Result<ResolverConfig> {
    let mut config = ResolverConfig::load_or_default(cli.config.as_deref())?;

    if cli.no_platform {
        config = config.with_platform(None);
    } else if let Some(platform) = &cli.platform {
        config = config.with_platform(Some(platform.clone()));
    }
    if cli.keep_results {
        config = config.with_keep_results(true);
    }
    if let Some(syft_binary) = &cli.syft_binary {
        config = config.with_syft_binary(syft_binary);
    }

    config.validate()?;
    Ok(config)
}
