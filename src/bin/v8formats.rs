//! v8formats Binary
//!
//! Command-line front end for the container pipeline.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};
use v8formats::{Config, OperationMode, Pipeline};

/// v8formats
#[derive(Parser, Debug)]
#[command(name = "v8formats")]
#[command(about = "Unpack, pack, parse and build 1C:Enterprise 8 container files")]
#[command(version)]
struct Args {
    /// Blob storage strategy
    #[arg(long, value_enum, default_value = "optimal", global = true)]
    mode: Mode,

    /// Parent directory for scratch files (kept in a `v8formats` subdirectory)
    #[arg(long, global = true)]
    temp_dir: Option<PathBuf>,

    /// Blobs above this size (in bytes) are spilled to disk in optimal mode
    #[arg(long, global = true)]
    spill_threshold: Option<u64>,

    /// Log progress (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a container into FileHeader and per-element .header/.data files
    Unpack {
        in_file: PathBuf,
        out_dir: PathBuf,

        /// Only unpack the element with this name
        #[arg(short, long)]
        element: Option<String>,
    },

    /// Reassemble an unpacked directory into a container, uncompressed
    Pack { in_dir: PathBuf, out_file: PathBuf },

    /// Decompress a raw deflate file
    Inflate { in_file: PathBuf, out_file: PathBuf },

    /// Compress a file as raw deflate
    Deflate { in_file: PathBuf, out_file: PathBuf },

    /// Decode a container recursively into a directory tree
    Parse { in_file: PathBuf, out_dir: PathBuf },

    /// Build a compressed container from a directory tree
    Build { in_dir: PathBuf, out_file: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Optimal,
    Memory,
    Filesystem,
}

impl From<Mode> for OperationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Optimal => OperationMode::Optimal,
            Mode::Memory => OperationMode::MemoryUsage,
            Mode::Filesystem => OperationMode::FileSystem,
        }
    }
}

fn main() -> ExitCode {
    // clap exits with status 2 on usage errors
    let args = Args::parse();

    // Initialize tracing/logging
    let default_filter = if args.verbose { "info,v8formats=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut builder = Config::builder().mode(args.mode.into());
    if let Some(dir) = &args.temp_dir {
        builder = builder.temp_root(dir);
    }
    if let Some(bytes) = args.spill_threshold {
        builder = builder.spill_threshold(bytes);
    }
    let pipeline = Pipeline::new(builder.build());

    let outcome = match &args.command {
        Commands::Unpack { in_file, out_dir, element: Some(name) } => pipeline
            .unpack_element(in_file, out_dir, name)
            .map(|n| format!("unpacked {} element(s) into {}", n, out_dir.display())),
        Commands::Unpack { in_file, out_dir, element: None } => pipeline
            .unpack(in_file, out_dir)
            .map(|n| format!("unpacked {} element(s) into {}", n, out_dir.display())),
        Commands::Pack { in_dir, out_file } => pipeline
            .pack(in_dir, out_file)
            .map(|n| format!("packed {} bytes into {}", n, out_file.display())),
        Commands::Inflate { in_file, out_file } => pipeline
            .inflate(in_file, out_file)
            .map(|n| format!("inflated {} bytes into {}", n, out_file.display())),
        Commands::Deflate { in_file, out_file } => pipeline
            .deflate(in_file, out_file)
            .map(|n| format!("deflated into {} bytes in {}", n, out_file.display())),
        Commands::Parse { in_file, out_dir } => pipeline
            .parse(in_file, out_dir)
            .map(|n| format!("parsed {} file(s) into {}", n, out_dir.display())),
        Commands::Build { in_dir, out_file } => pipeline
            .build(in_dir, out_file)
            .map(|n| format!("built {} bytes into {}", n, out_file.display())),
    };

    match outcome {
        Ok(summary) => {
            tracing::info!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
