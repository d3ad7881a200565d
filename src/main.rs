use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use value_filter::commands::{apply, archive};
use value_filter::core::compression::{ArchiveFormat, TarCompression};

#[derive(Parser)]
#[command(name = "value-filter")]
#[command(version, about = "Run value filters and archive helpers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a filter chain over a JSON value
    Apply {
        /// Chain specification (JSON)
        #[arg(short, long)]
        chain: PathBuf,

        /// JSON document holding the value; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Compress a directory, a file or literal text into an archive
    Compress {
        /// Directory, file, or text to store
        source: String,

        /// Archive to create or replace
        #[arg(short, long)]
        archive: PathBuf,

        #[arg(long, value_enum, default_value = "zip")]
        adapter: AdapterArg,

        /// Tarball compression
        #[arg(long, value_enum, default_value = "gz")]
        mode: ModeArg,

        /// Entry name when the source is literal text
        #[arg(long)]
        file_name: Option<String>,
    },

    /// Expand an archive into a directory
    Decompress {
        archive: PathBuf,

        #[arg(short, long)]
        target: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AdapterArg {
    Zip,
    Tar,
    #[value(name = "7z")]
    SevenZ,
}

impl From<AdapterArg> for ArchiveFormat {
    fn from(arg: AdapterArg) -> Self {
        match arg {
            AdapterArg::Zip => ArchiveFormat::Zip,
            AdapterArg::Tar => ArchiveFormat::Tar,
            AdapterArg::SevenZ => ArchiveFormat::SevenZ,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Gz,
    Bz2,
    None,
}

impl From<ModeArg> for TarCompression {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Gz => TarCompression::Gz,
            ModeArg::Bz2 => TarCompression::Bz2,
            ModeArg::None => TarCompression::None,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply { chain, input } => apply::apply_chain(&chain, input.as_deref()),
        Commands::Compress {
            source,
            archive: archive_path,
            adapter,
            mode,
            file_name,
        } => archive::compress(&source, &archive_path, adapter.into(), mode.into(), file_name),
        Commands::Decompress {
            archive: archive_path,
            target,
        } => archive::decompress(&archive_path, &target),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
