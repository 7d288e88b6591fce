mod cli;

use ffweave::{config, Config, FfmpegCommand, Job, ProgressParser};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::io::Read;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag.
    // Logs go to stderr; stdout carries command strings and JSON.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "ffweave=debug,ffweave_core=debug,ffweave_graph=debug,ffweave_progress=trace".to_string()
        } else {
            "ffweave=info,ffweave_core=warn,ffweave_graph=warn,ffweave_progress=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render { job, no_program } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            render_job(&job, &config, no_program)
        }
        Commands::Tokens { job, pretty } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            print_tokens(&job, &config, pretty)
        }
        Commands::Progress { file, log } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(follow_progress(file.as_deref(), &config, log))
        }
        Commands::Validate { job } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            validate_job(&job, &config)
        }
        Commands::CheckConfig {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            check_config(path.as_deref())
        }
        Commands::Version => {
            println!("ffweave {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_job(path: &Path) -> Result<Job> {
    if path == Path::new("-") {
        let mut json = String::new();
        std::io::stdin()
            .read_to_string(&mut json)
            .context("Failed to read job from stdin")?;
        return Job::from_json(&json).context("Invalid job on stdin");
    }

    if !path.exists() {
        anyhow::bail!("Job file does not exist: {:?}", path);
    }
    Job::from_path(path).with_context(|| format!("Invalid job file {:?}", path))
}

fn build_command(path: &Path, config: &Config) -> Result<FfmpegCommand> {
    let job = load_job(path)?;
    let command = job
        .apply(FfmpegCommand::from_config(&config.ffmpeg))
        .with_context(|| format!("Job {:?} does not describe a valid command", path))?;
    tracing::info!(
        "Built command from {:?}: {} inputs, {} filter chains, {} outputs",
        path,
        command.inputs().len(),
        command.filter_graph().len(),
        command.outputs().len()
    );
    Ok(command)
}

fn render_job(path: &Path, config: &Config, no_program: bool) -> Result<()> {
    let command = build_command(path, config)?;
    if no_program {
        let tokens = command.to_command_tokens();
        println!("{}", ffweave::quote::to_command_string(None, &tokens));
    } else {
        println!("{}", command.to_command_string());
    }
    Ok(())
}

fn print_tokens(path: &Path, config: &Config, pretty: bool) -> Result<()> {
    let tokens = build_command(path, config)?.to_command_tokens();
    let json = if pretty {
        serde_json::to_string_pretty(&tokens)?
    } else {
        serde_json::to_string(&tokens)?
    };
    println!("{}", json);
    Ok(())
}

async fn follow_progress(source: Option<&Path>, config: &Config, show_log: bool) -> Result<()> {
    let mut parser = ProgressParser::from_config(&config.progress);
    parser.on_update(|update| match serde_json::to_string(update) {
        Ok(line) => println!("{}", line),
        Err(e) => tracing::error!("Failed to serialize progress update: {}", e),
    });

    let bytes = match source {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open progress stream {:?}", path))?;
            ffweave::consume(&mut parser, file).await?
        }
        None => ffweave::consume(&mut parser, tokio::io::stdin()).await?,
    };

    tracing::info!(
        "Read {} bytes: {} updates, last media time {}",
        bytes,
        parser.update_count(),
        parser.last_media_time()
    );

    if show_log {
        print!("{}", parser.formatted_log());
    }

    Ok(())
}

fn validate_job(path: &Path, config: &Config) -> Result<()> {
    println!("Validating job: {:?}", path);
    let command = build_command(path, config)?;
    println!("✓ Job is valid");
    println!("  Inputs: {}", command.inputs().len());
    println!("  Filter chains: {}", command.filter_graph().len());
    println!("  Outputs: {}", command.outputs().len());
    println!("  Arguments: {}", command.to_command_tokens().len());
    Ok(())
}

fn check_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, searching default locations");
            config::load_config_or_default(None)?
        }
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        println!("Configuration loaded with {} warning(s):", warnings.len());
        for warning in &warnings {
            println!("  ! {}", warning);
        }
    }

    println!("  Program: {}", config.ffmpeg.program);
    println!("  Overwrite: {}", config.ffmpeg.overwrite);
    println!("  Hide banner: {}", config.ffmpeg.hide_banner);
    if let Some(ref url) = config.ffmpeg.progress_url {
        println!("  Progress url: {}", url);
    }
    match config.progress.log_capacity {
        Some(n) => println!("  Log capacity: {}", n),
        None => println!("  Log capacity: unbounded"),
    }

    Ok(())
}
