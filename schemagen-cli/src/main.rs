//! schemagen command-line tool
//!
//! Generates Oracle DDL scripts from a schema outline, regenerates the clean
//! script for an existing output directory, or writes a starter configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use schemagen::build_script::write_build_script;
use schemagen::clean::write_clean_script;
use schemagen::config::DEFAULT_CONFIG_PATH;
use schemagen::{Generator, GeneratorConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "schemagen")]
#[command(about = "Oracle DDL generator for tabular schema outlines")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every script from the schema and grants outlines
    Generate {
        /// Render worker count (overrides the configuration; 0 = all CPUs)
        #[arg(long)]
        workers: Option<usize>,

        /// Schema outline CSV (overrides the configuration)
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Output directory (overrides the configuration)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Keep files already present in the output directory
        #[arg(long)]
        keep_output: bool,
    },

    /// Rebuild the build and clean scripts for an existing output directory
    Clean {
        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write the effective configuration as JSON
    Init {
        /// Destination file
        #[arg(default_value = "config/config.json")]
        path: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match GeneratorConfig::load_from(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error loading configuration:".red(), e);
            process::exit(1);
        }
    };

    let default_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = match cli.command {
        Commands::Generate {
            workers,
            schema,
            output,
            keep_output,
        } => handle_generate(config, workers, schema, output, keep_output),
        Commands::Clean { output } => handle_clean(&config, output),
        Commands::Init { path, force } => handle_init(&config, &path, force),
    };

    match result {
        Ok(()) => {
            if !cli.quiet {
                println!("{}", "Success".green());
            }
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            process::exit(1);
        }
    }
}

fn handle_generate(
    mut config: GeneratorConfig,
    workers: Option<usize>,
    schema: Option<PathBuf>,
    output: Option<PathBuf>,
    keep_output: bool,
) -> Result<()> {
    if let Some(workers) = workers {
        config.workers = workers;
    }
    if let Some(schema) = schema {
        config.files.schema_file = schema.display().to_string();
    }
    if let Some(output) = output {
        config.files.output_directory = output.display().to_string();
    }

    let mut generator = Generator::new(config);
    if keep_output {
        generator = generator.keep_output();
    }
    let summary = generator.run().context("schema generation failed")?;

    println!("\nGeneration Summary\n");
    println!("  Tables:    {}", summary.tables);
    println!("  Scripts:   {}", summary.artifacts);
    if !summary.history_schemas.is_empty() {
        println!("  History packages: {}", summary.history_schemas.join(", "));
    }
    if !summary.loader_schemas.is_empty() {
        println!("  Loader packages:  {}", summary.loader_schemas.join(", "));
    }
    println!(
        "  Output:    {}",
        generator.config().files.output_directory.as_str().bold()
    );
    Ok(())
}

fn handle_clean(config: &GeneratorConfig, output: Option<PathBuf>) -> Result<()> {
    let root = output.unwrap_or_else(|| PathBuf::from(&config.files.output_directory));
    if !root.is_dir() {
        anyhow::bail!("output directory {} does not exist", root.display());
    }
    let build = write_build_script(&root, &config.files.build_file)
        .with_context(|| format!("writing build script in {}", root.display()))?;
    let clean = write_clean_script(&root, &config.files.clean_file)
        .with_context(|| format!("writing clean script in {}", root.display()))?;
    println!("Wrote {}", build.display());
    println!("Wrote {}", clean.display());
    Ok(())
}

fn handle_init(config: &GeneratorConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to replace it)", path.display());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = config.to_json_pretty()?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("Created {}", path.display());
    println!("Use it with: schemagen --config {} generate", path.display());
    Ok(())
}
