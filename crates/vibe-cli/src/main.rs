use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};
use vibe_lib::{
    batch, extract_ex_number, io::csv as csv_io, merge_tables, MergeConfig, MergeError,
    SourceTable,
};

#[derive(Parser)]
#[command(
    name = "vibe",
    version,
    about = "vibeprep: dataset preparation tools for vibration recordings"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge each class folder under ROOT into one continuous-time CSV
    Merge {
        /// Directory whose immediate subdirectories are classes
        root: PathBuf,
        /// Output directory (default: ./outputs)
        output: Option<PathBuf>,
        /// Header token identifying the time column
        #[arg(long)]
        target: Option<String>,
        /// Extension of the files to merge
        #[arg(long)]
        extension: Option<String>,
        /// TOML file with merge settings; flags override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also write the run summary as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },
    /// Print the files of DIR in merge order, one JSON object per line
    Order {
        dir: PathBuf,
        #[arg(long, default_value = "csv")]
        extension: String,
    },
    /// Merge explicit files (in the order given) into one CSV
    MergeFiles {
        #[arg(long, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = "channel")]
        target: String,
    },
}

#[derive(Serialize)]
struct OrderEntry {
    file: String,
    ordinal: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Merge {
            root,
            output,
            target,
            extension,
            config,
            summary_json,
        } => {
            let mut cfg = match config {
                Some(path) => MergeConfig::load(&path)?,
                None => MergeConfig::default(),
            };
            if let Some(output) = output {
                cfg.output_dir = output;
            }
            if let Some(target) = target {
                cfg.target_column = target;
            }
            if let Some(extension) = extension {
                cfg.extension = extension;
            }
            cmd_merge(&root, &cfg, summary_json.as_deref())?
        }
        Commands::Order { dir, extension } => {
            env_logger::init();
            cmd_order(&dir, &extension)?
        }
        Commands::MergeFiles {
            inputs,
            out,
            target,
        } => {
            env_logger::init();
            cmd_merge_files(&inputs, &out, &target)?
        }
    }
    Ok(())
}

/// Duplicates every log line to stdout and the run's log file.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

fn init_tee_logger(output_dir: &Path) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = output_dir.join(format!("merger_log_{}.txt", stamp));
    let file =
        File::create(&log_path).with_context(|| format!("creating {}", log_path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .target(env_logger::Target::Pipe(Box::new(TeeWriter { file })))
        .try_init()?;
    Ok(log_path)
}

fn cmd_merge(root: &Path, cfg: &MergeConfig, summary_json: Option<&Path>) -> Result<()> {
    // Checked before the logger exists so a bad root leaves no log file behind.
    if !root.is_dir() {
        return Err(MergeError::MissingRoot {
            path: root.to_path_buf(),
        }
        .into());
    }
    fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("creating {}", cfg.output_dir.display()))?;
    let log_path = init_tee_logger(&cfg.output_dir)?;
    info!(
        "Logging started at: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("Log file: {}", log_path.display());
    info!("{}", "=".repeat(60));

    let result = batch::run(root, cfg);

    info!("");
    info!("{}", "=".repeat(60));
    info!(
        "Logging ended at: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    log::logger().flush();

    let summary = result?;
    if let Some(path) = summary_json {
        let js = serde_json::to_string_pretty(&summary)?;
        fs::write(path, js).with_context(|| format!("writing {}", path.display()))?;
    }
    println!("Log saved to: {}", log_path.display());
    println!("Processing complete! {} class(es) merged.", summary.merged_classes());
    Ok(())
}

fn cmd_order(dir: &Path, extension: &str) -> Result<()> {
    for path in batch::class_files(dir, extension)? {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ordinal = extract_ex_number(&file);
        println!("{}", serde_json::to_string(&OrderEntry { file, ordinal })?);
    }
    Ok(())
}

fn cmd_merge_files(inputs: &[PathBuf], out: &Path, target: &str) -> Result<()> {
    let mut sources = Vec::with_capacity(inputs.len());
    for path in inputs {
        let table = csv_io::read_table(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        sources.push(SourceTable::new(name, table));
    }
    let outcome = merge_tables(&sources, target)?;
    csv_io::write_table(out, &outcome.table)?;
    println!("{}", serde_json::to_string(&outcome.segments)?);
    Ok(())
}
