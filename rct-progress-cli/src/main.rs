use clap::{Args, Parser, Subcommand};
use log::{debug, LevelFilter};
use std::path::{Path, PathBuf};

use rct_progress_core::{export_rows, run, HighscoreSettings, RowSource};

#[derive(Debug, Parser)]
#[command(
    name = "rct-progress",
    version,
    about = "Decode RCT1 CSS0.DAT progress and build OpenRCT2 highscores.dat"
)]
struct Cli {
    /// Print extra logs.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode CSS0.DAT and write its scenario table as CSV.
    Parse {
        /// CSS0.DAT, or a directory containing it.
        #[arg(long, short, default_value = "CSS0.DAT")]
        input: PathBuf,

        #[arg(long, short, default_value = "css0_parsed.csv")]
        output: PathBuf,

        /// Keep the decompressed/decrypted buffers next to the input.
        #[arg(long, short)]
        keep_intermediate: bool,
    },
    /// Build or merge highscores.dat from CSS0.DAT or a CSV.
    Highscores(HighscoreArgs),
}

#[derive(Debug, Args)]
struct HighscoreArgs {
    /// CSS0.DAT, or a directory containing it.
    #[arg(long, conflicts_with = "input", required_unless_present_any = ["input", "config"])]
    css0: Option<PathBuf>,

    /// CSV with filename, name, company_value, winner columns.
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Output highscores.dat. Defaults to the OpenRCT2 user directory.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Merge into the existing file, keeping the higher company value per
    /// scenario.
    #[arg(long)]
    merge: bool,

    /// Also write the rows decoded from CSS0.DAT as CSV.
    #[arg(long, value_name = "CSV")]
    rows_csv: Option<PathBuf>,

    #[arg(long, short)]
    keep_intermediate: bool,

    /// JSON settings file; flags given on the command line take precedence.
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,
}

fn setup_logging(verbose: bool) -> Result<(), fern::InitError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn default_openrct2_dir() -> Option<PathBuf> {
    let base = if cfg!(windows) {
        dirs::document_dir()
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
    } else {
        dirs::config_dir()
    }?;
    Some(base.join("OpenRCT2"))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn resolve_settings(args: HighscoreArgs) -> Result<HighscoreSettings, String> {
    let from_file = match &args.config {
        Some(path) => Some(
            HighscoreSettings::from_json_file(path)
                .map_err(|e| format!("Failed to read {:?}: {}", path, e))?,
        ),
        None => None,
    };

    let source = match (args.css0, args.input) {
        (Some(css0), _) => RowSource::Archive(absolute(&css0)),
        (None, Some(csv)) => RowSource::Csv(absolute(&csv)),
        (None, None) => from_file
            .as_ref()
            .map(|s| s.source.clone())
            .ok_or_else(|| "either --css0 or --input is required".to_string())?,
    };

    let output_path = match args.output {
        Some(path) => path,
        None => match from_file.as_ref() {
            Some(s) => s.output_path.clone(),
            None => default_openrct2_dir()
                .ok_or_else(|| "could not determine the OpenRCT2 directory; pass --output".to_string())?
                .join("highscores.dat"),
        },
    };

    let file_flag = |f: fn(&HighscoreSettings) -> bool| from_file.as_ref().map_or(false, f);

    Ok(HighscoreSettings {
        merge: args.merge || file_flag(|s| s.merge),
        keep_intermediate: args.keep_intermediate || file_flag(|s| s.keep_intermediate),
        rows_csv: args
            .rows_csv
            .or_else(|| from_file.as_ref().and_then(|s| s.rows_csv.clone())),
        source,
        output_path,
    })
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("Failed to initialise logging: {e}");
    }

    match cli.command {
        Command::Parse {
            input,
            output,
            keep_intermediate,
        } => {
            let input = absolute(&input);
            let output = absolute(&output);
            match export_rows(&input, &output, keep_intermediate) {
                Ok(records) => {
                    println!("Parsed rows written: {}", output.display());
                    println!("Rows: {}", records.len());
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    std::process::exit(1);
                }
            }
        }
        Command::Highscores(args) => {
            let settings = match resolve_settings(args) {
                Ok(settings) => settings,
                Err(msg) => {
                    eprintln!("Error: {msg}");
                    std::process::exit(1);
                }
            };
            if let Ok(json) = serde_json::to_string(&settings) {
                debug!("settings: {}", json);
            }

            match run(&settings) {
                Ok(summary) => {
                    let verb = if summary.merged_from_existing.is_some() {
                        "merged and written"
                    } else {
                        "written"
                    };
                    println!("highscores.dat {}: {}", verb, summary.output_path.display());
                    println!("Entries: {}", summary.entries_written);
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    std::process::exit(1);
                }
            }
        }
    }
}
