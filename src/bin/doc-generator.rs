use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hb_docs_data::config::{self, Loader};
use hb_docs_data::devices::sync_devices;
use hb_docs_data::generator::{parse_all_subsystems, RunReport};
use hb_docs_data::{logging, watch, DocsConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "doc-generator")]
#[command(about = "Generate the documentation site's JSON data from HyperBEAM analysis markdown")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Configuration file layered over the built-in defaults (default: ./hbdocs.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    generate: GenerateArgs,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Parse every subsystem and write the data tree (the default)
    Generate(GenerateArgs),
    /// Run the external device parser and merge its output into the site data
    SyncDevices(SyncArgs),
}

#[derive(Args, Clone, Default)]
struct GenerateArgs {
    /// Analysis root containing core_analysis/, device_analysis/, ...
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Target data root
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep running and regenerate when markdown changes
    #[arg(short, long)]
    watch: bool,
}

#[derive(Args, Clone)]
struct SyncArgs {
    /// External parser script to run before copying
    #[arg(long)]
    script: Option<PathBuf>,

    /// Directory the parser writes its JSON into
    #[arg(long)]
    parser_output: Option<PathBuf>,

    /// Site directory receiving the device JSON
    #[arg(long)]
    target: Option<PathBuf>,

    /// Curated device list merged by id
    #[arg(long)]
    device_list: Option<PathBuf>,
}

fn load_config(cli: &Cli, overrides: impl FnOnce(Loader) -> Result<Loader>) -> Result<DocsConfig> {
    let loader = config::loader_for(cli.config.as_deref());
    overrides(loader)?.build().context("failed to load configuration")
}

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command.clone() {
        Some(Command::SyncDevices(args)) => run_sync(&cli, args),
        Some(Command::Generate(args)) => run_generate(&cli, args),
        None => run_generate(&cli, cli.generate.clone()),
    }
}

fn run_generate(cli: &Cli, args: GenerateArgs) -> Result<()> {
    let config = load_config(cli, |loader| {
        Ok(loader
            .override_path("paths.source_root", args.source.as_deref())?
            .override_path("paths.target_root", args.output.as_deref())?)
    })?;

    println!("🔍 Parsing analysis markdown from: {}", config.paths.source_root.display());
    let report = parse_all_subsystems(&config.paths).context("generation failed")?;
    print_summary(&report, &config);

    if args.watch {
        watch::watch(
            &config.paths,
            Duration::from_millis(config.watch.debounce_ms),
            |report| print_summary(report, &config),
        )
        .context("watching source tree")?;
    }
    Ok(())
}

fn print_summary(report: &RunReport, config: &DocsConfig) {
    println!("📊 Parsing summary:");
    for stats in &report.stats {
        println!(
            "  {:<10} {:>3} overviews, {:>4} components",
            stats.subsystem, stats.overviews, stats.components
        );
    }
    println!(
        "  total      {:>3} overviews, {:>4} components",
        report.total_overviews(),
        report.total_components()
    );
    if !report.misplaced.is_empty() {
        println!("  {} components sit outside their classified subsystem", report.misplaced.len());
    }
    if !report.failures.is_empty() {
        eprintln!("⚠️  {} files failed:", report.failures.len());
        for failure in &report.failures {
            eprintln!("  {}: {}", failure.path.display(), failure.message);
        }
    }
    println!("✅ Data written to: {}", config.paths.target_root.display());
}

fn run_sync(cli: &Cli, args: SyncArgs) -> Result<()> {
    let config = load_config(cli, |loader| {
        Ok(loader
            .override_path("devices.parser_script", args.script.as_deref())?
            .override_path("devices.parser_output", args.parser_output.as_deref())?
            .override_path("devices.target_dir", args.target.as_deref())?
            .override_path("devices.device_list", args.device_list.as_deref())?)
    })?;

    let report = sync_devices(&config.devices).context("device sync failed")?;
    println!(
        "📝 Copied {} device files to: {}",
        report.copied.len(),
        config.devices.target_dir.display()
    );
    match report.merge {
        Some(merge) => println!(
            "✅ Device list updated: {} replaced, {} added",
            merge.updated, merge.appended
        ),
        None => println!("⚠️  Device list left unchanged"),
    }
    Ok(())
}
