//! hwinv - hardware inventory with scannable QR device codes.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::debug;

use hwinv::cli::{self, Cli, Commands};
use hwinv::config::Settings;
use hwinv::controller::Inventory;
use hwinv::error::{InvError, Result};
use hwinv::identifier::encode_png_base64;
use hwinv::logging::init_logging;
use hwinv::output::{Output, OutputMode, VersionInfo};
use hwinv::scanner::{
    BoxedSource, ImageFileSource, ScanOptions, ScanSession, ScanTick, SnapshotDirSource,
};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> &'static str {
        option_env!("VERGEN_GIT_DIRTY").unwrap_or("false")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();

    // Handle no-color flag or non-TTY
    if cli.no_color || !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let mode = OutputMode::from_cli(&cli);
    init_logging(mode.is_robot(), cli.verbose, cli.quiet);

    let output = mode.into_output();
    if let Err(e) = run(&cli, output.as_ref()) {
        output.error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, output: &dyn Output) -> Result<()> {
    match &cli.command {
        None => print_quick_start(cli),
        Some(Commands::Add(args)) => cmd_add(cli, output, args),
        Some(Commands::Edit(args)) => cmd_edit(cli, output, args),
        Some(Commands::Delete(args)) => cmd_delete(cli, output, args),
        Some(Commands::List(args)) => cmd_list(cli, output, args),
        Some(Commands::Show(args)) => cmd_show(cli, output, args),
        Some(Commands::Scan(args)) => cmd_scan(cli, output, args),
        Some(Commands::Code(args)) => cmd_code(cli, output, args),
        Some(Commands::Lookup(args)) => cmd_lookup(cli, output, args),
        Some(Commands::Status) => cmd_status(cli, output),
        Some(Commands::Version) => cmd_version(output),
        Some(Commands::Completions(args)) => cmd_completions(args),
    }
}

/// Settings from `--config` or the default location.
fn load_settings(cli: &Cli) -> Result<Settings> {
    Settings::load_or_default(cli.config.as_deref())
}

/// Open the inventory the flags and settings point at.
fn open_inventory(cli: &Cli, settings: &Settings) -> Result<Inventory> {
    let data_dir = settings.data_dir(cli.data_dir.as_deref())?;
    debug!(data_dir = %data_dir.display(), "Opening inventory");
    Inventory::open_in(&data_dir, settings.codes.to_style())
}

fn open_default(cli: &Cli) -> Result<Inventory> {
    let settings = load_settings(cli)?;
    open_inventory(cli, &settings)
}

// === Quick Start (Robot Mode Optimized) ===

/// Prints quick-start help optimized for both humans and AI agents.
#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn print_quick_start(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        print_robot_quick_start(cli);
    } else {
        print_human_quick_start();
    }
    Ok(())
}

fn print_robot_quick_start(cli: &Cli) {
    let help = RobotQuickStart {
        tool: "hwinv",
        version: build_info::VERSION,
        description: "Hardware inventory with scannable QR device codes",
        records: RobotRecords {
            add: "hwinv add --name <NAME> --serial <SERIAL> --purchase-date <YYYY-MM-DD> --location <LOCATION>",
            edit: "hwinv edit <OLD_SERIAL> [--name ..] [--serial ..] [--purchase-date ..] [--location ..]",
            delete: "hwinv delete <SERIAL>",
            list: "hwinv list [FILTER] --robot",
            show: "hwinv show <SERIAL> --robot",
        },
        codes: RobotCodes {
            scan_images: "hwinv scan <IMAGE>... --robot",
            scan_watch: "hwinv scan --watch-dir <DIR> --timeout <SECS> --robot",
            regenerate: "hwinv code <SERIAL> [--base64]",
            lookup: "hwinv lookup <SERIAL-NAME> --robot",
        },
        identifier: "Each device is encoded as '<serial>-<name>'",
        output_modes: OutputModes {
            human: "--format=text (default)",
            robot: "--robot or --format=json",
            compact: "--format=json-compact",
        },
        data_dir: "--data-dir <DIR> or HWINV_DATA_DIR",
    };

    output_json(cli, &help);
}

fn print_human_quick_start() {
    println!(
        "{} {} - Hardware inventory\n",
        "hwinv".bold().cyan(),
        build_info::VERSION
    );

    println!("{}", "QUICK START".bold().underline());
    println!();

    println!(
        "  {}  Add a device",
        "hwinv add -n Laptop -s SN1 -d 2024-01-01 -l Office".green()
    );
    println!("  {}  List devices", "hwinv list".green());
    println!("  {}  Search by name or serial", "hwinv search lap".green());
    println!("  {}  Scan a photo of a code", "hwinv scan photo.jpg".green());
    println!("  {}  Regenerate a QR code", "hwinv code SN1".green());
    println!("  {}  Delete a device", "hwinv delete SN1".green());
    println!();

    println!("{}", "ROBOT MODE (for AI agents)".bold().underline());
    println!();
    println!("  {}  JSON output", "hwinv --robot <command>".cyan());
    println!("  {}  Quick-start JSON", "hwinv --robot".cyan());
    println!();

    println!("Run {} for full help", "hwinv --help".yellow());
}

// === Robot Mode JSON Structures ===

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    records: RobotRecords,
    codes: RobotCodes,
    identifier: &'static str,
    output_modes: OutputModes,
    data_dir: &'static str,
}

#[derive(Serialize)]
struct RobotRecords {
    add: &'static str,
    edit: &'static str,
    delete: &'static str,
    list: &'static str,
    show: &'static str,
}

#[derive(Serialize)]
struct RobotCodes {
    scan_images: &'static str,
    scan_watch: &'static str,
    regenerate: &'static str,
    lookup: &'static str,
}

#[derive(Serialize)]
struct OutputModes {
    human: &'static str,
    robot: &'static str,
    compact: &'static str,
}

// === Record Commands ===

fn cmd_add(cli: &Cli, output: &dyn Output, args: &cli::AddArgs) -> Result<()> {
    let inventory = open_default(cli)?;
    let saved = inventory.save(&args.to_form())?;
    output.device_saved(&saved, false);
    Ok(())
}

fn cmd_edit(cli: &Cli, output: &dyn Output, args: &cli::EditArgs) -> Result<()> {
    let inventory = open_default(cli)?;
    let current = inventory.show(&args.old_serial)?;
    let saved = inventory.edit(&args.old_serial, &args.to_form(&current))?;
    output.device_saved(&saved, true);
    Ok(())
}

fn cmd_delete(cli: &Cli, output: &dyn Output, args: &cli::DeleteArgs) -> Result<()> {
    let inventory = open_default(cli)?;
    let report = inventory.delete(&args.serial)?;
    output.device_deleted(&report);
    Ok(())
}

fn cmd_list(cli: &Cli, output: &dyn Output, args: &cli::ListArgs) -> Result<()> {
    let inventory = open_default(cli)?;
    let filter = args.filter.as_deref();
    let devices = inventory.list(filter)?;
    output.device_list(&devices, filter);
    Ok(())
}

fn cmd_show(cli: &Cli, output: &dyn Output, args: &cli::ShowArgs) -> Result<()> {
    let inventory = open_default(cli)?;
    let device = inventory.show(&args.serial)?;
    let code_path = inventory.codes().path_for(&device.identifier);
    output.device_detail(&device, code_path.is_file().then_some(code_path.as_path()));
    Ok(())
}

// === Code Commands ===

fn cmd_scan(cli: &Cli, output: &dyn Output, args: &cli::ScanArgs) -> Result<()> {
    let settings = load_settings(cli)?;
    let inventory = open_inventory(cli, &settings)?;

    let mut options: ScanOptions = settings.scan.to_options();
    if let Some(ms) = args.interval_ms {
        options.interval = Duration::from_millis(ms);
    }
    if let Some(secs) = args.timeout {
        options.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if let Some(max) = args.max_failures {
        options.max_consecutive_failures = max.max(1);
    }

    let source: BoxedSource = match &args.watch_dir {
        Some(dir) => {
            let source = SnapshotDirSource::open(dir)?;
            Box::new(if args.include_existing {
                source.include_existing()
            } else {
                source
            })
        }
        None => Box::new(ImageFileSource::open(args.images.clone())?),
    };
    let session = ScanSession::new(source);

    let human = !OutputMode::from_cli(cli).is_robot();
    let spinner = (human && !cli.quiet && io::stderr().is_terminal())
        .then(|| scan_spinner(&session.describe()));
    let cancel = AtomicBool::new(false);

    let result = inventory.scan(session, &options, &cancel, |tick: ScanTick| {
        if let Some(bar) = &spinner {
            bar.set_message(format!("{} frame(s) read, no code yet", tick.frames));
            bar.tick();
        }
    });
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    output.scan_report(&result?);
    Ok(())
}

fn scan_spinner(source: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} Scanning {prefix}: {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_prefix(source.to_string());
    bar.set_message("waiting for a frame");
    bar
}

fn cmd_code(cli: &Cli, output: &dyn Output, args: &cli::CodeArgs) -> Result<()> {
    let inventory = open_default(cli)?;
    let (device, path) = inventory.regenerate(&args.serial)?;

    let png_base64 = if args.base64 {
        Some(encode_png_base64(&device.identifier, inventory.codes().style())?)
    } else {
        None
    };
    output.code_generated(&device, &path, png_base64.as_deref());
    Ok(())
}

fn cmd_lookup(cli: &Cli, output: &dyn Output, args: &cli::LookupArgs) -> Result<()> {
    let inventory = open_default(cli)?;
    let device = inventory.lookup_scanned(&args.identifier)?;
    let code_path = inventory.codes().path_for(&device.identifier);
    output.device_detail(&device, code_path.is_file().then_some(code_path.as_path()));
    Ok(())
}

// === Utilities ===

fn cmd_status(cli: &Cli, output: &dyn Output) -> Result<()> {
    let settings = load_settings(cli)?;
    let inventory = open_inventory(cli, &settings)?;
    let status = inventory.status()?;
    output.status(&status, &settings);
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn cmd_version(output: &dyn Output) -> Result<()> {
    output.version_info(&VersionInfo {
        version: build_info::VERSION,
        git_sha: build_info::git_sha(),
        git_dirty: build_info::git_dirty() == "true",
        build_timestamp: build_info::build_timestamp(),
        rustc_version: build_info::rustc_semver(),
        target: build_info::target(),
    });
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn cmd_completions(args: &cli::CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "hwinv", &mut io::stdout());
    Ok(())
}

fn output_json<T: Serialize>(cli: &Cli, data: &T) {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("{}", InvError::Other(format!("serialization failed: {e}"))),
    }
}
