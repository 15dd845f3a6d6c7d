mod commands;

use clap::{Parser, Subcommand};
use omniarc::types::{CompressOptions, DecompressOptions, ListOptions};

#[derive(Parser)]
#[command(
    name = "omniarc",
    version,
    about = "Compress, extract and list ZIP, TAR, TAR.GZ, TAR.BZ2 and GZIP archives"
)]
struct Cli {
    /// Log engine activity to stderr (RUST_LOG overrides)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress files or directories into an archive
    #[command(visible_aliases = ["c", "add"])]
    Compress {
        #[arg(required = true, value_name = "PATHS")]
        paths: Vec<String>,

        /// Compression level (0-9)
        #[arg(short = 'l', long, default_value = "6")]
        level: u32,

        /// Archive type (zip, tar, tar.gz, tar.bz2, gzip)
        #[arg(short = 't', long = "type", default_value = "zip")]
        kind: String,

        /// Output archive file name
        #[arg(short = 'o', long)]
        output: Option<String>,

        /// Accepted for compatibility; archives are not encrypted
        #[arg(short = 'p', long)]
        password: Option<String>,
    },

    /// Extract files from an archive
    #[command(visible_aliases = ["d", "extract", "x"])]
    Decompress {
        archive: String,

        /// Output directory for extracted files
        #[arg(short = 'o', long, default_value = ".")]
        output: String,

        /// Accepted for compatibility; archives are read without decryption
        #[arg(short = 'p', long)]
        password: Option<String>,
    },

    /// List the contents of an archive without extracting it
    #[command(visible_aliases = ["l", "ls"])]
    List {
        archive: String,

        /// Print entries as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Print the version number
    Version,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    // Spinner redraws would interleave with debug log lines.
    let quiet = cli.verbose;
    let result = match cli.command {
        Commands::Compress {
            paths,
            level,
            kind,
            output,
            password,
        } => commands::compress::compress(
            &CompressOptions {
                paths,
                level,
                kind,
                output,
                password,
            },
            quiet,
        ),
        Commands::Decompress {
            archive,
            output,
            password,
        } => commands::decompress::decompress(
            &DecompressOptions {
                archive,
                output,
                password,
            },
            quiet,
        ),
        Commands::List { archive, json } => {
            commands::list::list(&ListOptions { archive, json })
        }
        Commands::Version => {
            commands::version::version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
