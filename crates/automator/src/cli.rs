use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use project_automator::{
    format_size, is_remote, run, Config, ProgressSink, RunRequest, PDF_EXTENSION,
};

const TICK_MS: u64 = 80;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(" {spinner} {msg}")
        .unwrap()
        .tick_chars("▏▎▍▌▋▊▉█▉▋▌▍▎")
}

#[derive(Parser)]
#[command(name = "project-automator")]
#[command(version)]
#[command(about = "Automate the creation of project showcase websites")]
struct Cli {
    #[arg(long, global = true, env = "AUTOMATOR_CONFIG", help = "JSON config file")]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Debug logging on stderr")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Organize project files from a directory or repository URL into category folders
    Organize {
        #[arg(help = "Source directory or GitHub repository URL")]
        source: String,
        #[arg(short, long, help = "Output directory [default: public/assets]")]
        output: Option<PathBuf>,
        #[arg(long, help = "Parent directory for temporary clones")]
        temp_dir: Option<PathBuf>,
        #[arg(long, help = "Print the result as JSON")]
        json: bool,
    },
    /// Show the category each file would be copied to
    Classify {
        #[arg(required = true, help = "Files to classify")]
        files: Vec<PathBuf>,
    },
    /// List categories and their extensions in precedence order
    Categories,
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        #[arg(help = "Shell to generate for (bash, zsh, fish, powershell)")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config to a file
    Init {
        #[arg(help = "Where to write the config")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(cli.config.as_deref())
        .context("failed to load config")?;

    match cli.command {
        Commands::Organize {
            source,
            output,
            temp_dir,
            json,
        } => cmd_organize(config, &source, output, temp_dir, json),
        Commands::Classify { files } => cmd_classify(&config, &files),
        Commands::Categories => cmd_categories(&config),
        Commands::Config {
            action: ConfigAction::Init { path },
        } => cmd_config_init(&path),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "project-automator",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "project_automator=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Prints progress lines above a spinner showing the latest one.
struct SpinnerSink {
    pb: ProgressBar,
}

impl ProgressSink for SpinnerSink {
    fn emit(&self, line: &str) {
        self.pb.suspend(|| println!("{}", line));
        self.pb.set_message(line.trim().to_string());
    }
}

fn cmd_organize(
    config: Config,
    source: &str,
    output: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = match temp_dir {
        Some(dir) => config.with_temp_dir(dir),
        None => config,
    };
    let output = output.unwrap_or_else(|| config.output_dir.clone());
    let request = RunRequest::new(source, output);

    if json {
        let stderr_sink = |line: &str| eprintln!("{}", line);
        let result = run(&request, &config, &stderr_sink)
            .with_context(|| format!("failed to organize {}", source))?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.enable_steady_tick(Duration::from_millis(TICK_MS));
    if is_remote(source) {
        pb.set_message(format!("Cloning {}", source));
    }

    let sink = SpinnerSink { pb };
    let outcome = run(&request, &config, &sink);
    sink.pb.finish_and_clear();

    let result = outcome.with_context(|| format!("failed to organize {}", source))?;
    println!(
        "\n{} copied, {} skipped, {} total",
        result.files_copied,
        result.files_skipped(),
        format_size(result.bytes_copied)
    );

    Ok(())
}

fn cmd_classify(config: &Config, files: &[PathBuf]) -> Result<()> {
    let classifier = config.classifier();
    for file in files {
        println!("  {:<14} {}", classifier.classify(file), file.display());
    }
    Ok(())
}

fn cmd_categories(config: &Config) -> Result<()> {
    println!("  {:<14} {} (always, ahead of the table)", "documents/pdf", PDF_EXTENSION);
    for entry in config.categories.entries() {
        let reachable: Vec<&str> = entry
            .extensions
            .iter()
            .map(String::as_str)
            .filter(|ext| *ext != PDF_EXTENSION)
            .collect();
        if !reachable.is_empty() {
            println!("  {:<14} {}", entry.category, reachable.join(" "));
        }
    }
    println!("  {:<14} everything else (not copied)", "others");
    Ok(())
}

fn cmd_config_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing config: {}", path.display());
    }
    Config::default()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
