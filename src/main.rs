use clap::{Parser, Subcommand};
use splitstitch::cli::{
    collect_info, show_info, split_file, stitch_file, verify_manifest, SplitOptions,
    StitchOptions, DEFAULT_PART_SIZE_MB,
};
use splitstitch::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Version info from build.rs
const VERSION: &str = env!("SPLITSTITCH_VERSION");
const BUILD: &str = env!("SPLITSTITCH_BUILD");
const PROFILE: &str = env!("SPLITSTITCH_PROFILE");
const GIT_HASH: &str = env!("SPLITSTITCH_GIT_HASH");

fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} {} build {} ({})", PROFILE, VERSION, BUILD, GIT_HASH))
}

#[derive(Parser)]
#[command(name = "splitstitch")]
#[command(author, about = "Split large files into parts and stitch them back with SHA-256 verification", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output (implies --verbose)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file into numbered parts plus a manifest
    #[command(alias = "s")]
    Split {
        /// File to split
        file: PathBuf,

        /// Part size in megabytes
        #[arg(value_name = "PART_SIZE_MB", default_value_t = DEFAULT_PART_SIZE_MB)]
        part_size_mb: u64,
    },

    /// Reassemble the original file from a manifest and its parts
    #[command(alias = "t")]
    Stitch {
        /// Manifest written by split
        manifest: PathBuf,

        /// Keep part files after a successful stitch
        #[arg(long)]
        keep_parts: bool,
    },

    /// Check that the parts match the manifest without writing anything
    #[command(alias = "v")]
    Verify {
        /// Manifest written by split
        manifest: PathBuf,
    },

    /// Show a manifest and the state of its parts
    #[command(alias = "i")]
    Info {
        /// Manifest written by split
        manifest: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        "trace"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Split { file, part_size_mb } => {
            let options = SplitOptions::from_megabytes(part_size_mb)?;
            let report = split_file(&file, &options)?;
            println!(
                "Split {} into {} parts ({} bytes)",
                file.display(),
                report.manifest.parts,
                report.manifest.total_size
            );
            println!("Manifest: {}", report.manifest_path.display());
            println!("SHA-256: {}", report.manifest.sha256);
        }

        Commands::Stitch {
            manifest,
            keep_parts,
        } => {
            let options = StitchOptions { keep_parts };
            let report = stitch_file(&manifest, &options)?;
            println!(
                "Stitched {} ({} bytes, sha256 {})",
                report.original.display(),
                report.total_size,
                report.sha256
            );
            if let Some(backup) = &report.backup {
                println!("Previous content saved to {}", backup.display());
            }
            if !report.orphaned_parts.is_empty() {
                println!(
                    "{} parts could not be removed and can be deleted by hand",
                    report.orphaned_parts.len()
                );
            }
        }

        Commands::Verify { manifest } => {
            let report = verify_manifest(&manifest)?;
            println!(
                "OK: {} parts, {} bytes, sha256 {}",
                report.check.parts.len(),
                report.check.total_size,
                report.check.sha256
            );
        }

        Commands::Info { manifest, json } => {
            if json {
                let report = collect_info(&manifest)?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", show_info(&manifest)?);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("splitstitch {}", get_version());
        return ExitCode::SUCCESS;
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            use clap::CommandFactory;
            if Cli::command().print_help().is_err() {
                return ExitCode::FAILURE;
            }
            println!();
            return ExitCode::SUCCESS;
        }
    };

    init_logging(cli.verbose, cli.debug);

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
