//! gemini-cli: send a test prompt or clear the response cache.
//!
//! Usage:
//!   gemini-cli [--config <file.yaml>] test <prompt> [--model <model>]
//!   gemini-cli [--config <file.yaml>] cache-clear [key]

use anyhow::{bail, Context};
use gemini_lib_rust::cache::{backend_from_settings, CacheConfig, ResponseCache};
use gemini_lib_rust::{Gemini, GeminiConfig, GenerationOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

struct Cli {
    config: Option<PathBuf>,
    command: Command,
}

enum Command {
    Test { prompt: String, model: Option<String> },
    CacheClear { key: Option<String> },
    Version,
    Help,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Help => {
            print_usage();
            Ok(())
        }
        Command::Version => {
            println!("gemini-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Test { prompt, model } => match load_config(cli.config.as_ref()) {
            Ok(config) => cmd_test(config, prompt, model).await,
            Err(e) => Err(e),
        },
        Command::CacheClear { key } => match load_config(cli.config.as_ref()) {
            Ok(config) => cmd_cache_clear(config, key).await,
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> anyhow::Result<Cli> {
    let mut config = None;
    let mut model = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().context("--config requires a file path")?;
                config = Some(PathBuf::from(path));
            }
            "--model" | "-m" => {
                model = Some(iter.next().context("--model requires a model name")?.clone());
            }
            "help" | "--help" | "-h" => {
                return Ok(Cli {
                    config,
                    command: Command::Help,
                })
            }
            "version" | "--version" | "-V" => {
                return Ok(Cli {
                    config,
                    command: Command::Version,
                })
            }
            other if other.starts_with("--") => bail!("Unknown option: {other}"),
            other => positional.push(other.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("test") => {
            let prompt = positional.next().context("test requires a prompt")?;
            Command::Test { prompt, model }
        }
        Some("cache-clear") => Command::CacheClear {
            key: positional.next(),
        },
        Some(other) => bail!("Unknown command: {other}"),
        None => Command::Help,
    };
    if let Some(extra) = positional.next() {
        bail!("Unexpected argument: {extra}");
    }

    Ok(Cli { config, command })
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GeminiConfig> {
    let config = match path {
        Some(p) => GeminiConfig::from_file(p)
            .with_context(|| format!("loading {}", p.display()))?
            .with_env_overrides(),
        None => GeminiConfig::from_env(),
    };
    init_tracing(&config);
    Ok(config)
}

fn init_tracing(config: &GeminiConfig) {
    let default = if config.logging.enabled { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn cmd_test(config: GeminiConfig, prompt: String, model: Option<String>) -> anyhow::Result<()> {
    let gemini = Gemini::from_config(&config)?;
    let mut options = GenerationOptions::new();
    if let Some(m) = model {
        options = options.model(m);
    }

    println!("Sending prompt to Gemini API...");
    let response = gemini.generate(prompt, options).await?;

    println!("Response:");
    println!("{}", response.content());
    println!();

    let usage = response.token_usage();
    let cost = format!("${:.6}", response.estimated_cost(gemini.pricing()));
    println!("Token Usage:");
    print_table(
        &["Prompt Tokens", "Completion Tokens", "Total Tokens", "Estimated Cost"],
        &[
            usage.prompt_tokens.to_string(),
            usage.completion_tokens.to_string(),
            usage.total_tokens.to_string(),
            cost,
        ],
    );
    Ok(())
}

async fn cmd_cache_clear(config: GeminiConfig, key: Option<String>) -> anyhow::Result<()> {
    let cache = ResponseCache::new(
        CacheConfig::from_settings(&config.cache),
        backend_from_settings(&config.cache),
    );
    match key {
        Some(key) => {
            if cache.forget(&key).await? {
                println!("Cache key '{key}' cleared successfully.");
            } else {
                println!("Cache key '{key}' not found or could not be cleared.");
            }
        }
        None => {
            cache.flush().await?;
            println!("Gemini cache ({}) cleared.", cache.backend_name());
        }
    }
    Ok(())
}

fn print_table(headers: &[&str], row: &[String]) {
    let widths: Vec<usize> = headers
        .iter()
        .zip(row)
        .map(|(h, v)| h.len().max(v.len()))
        .collect();
    let border: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+";
    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("| {:<w$} ", c, w = w))
            .collect::<String>()
            + "|"
    };

    println!("{border}");
    println!("{}", line(headers.to_vec()));
    println!("{border}");
    println!("{}", line(row.iter().map(String::as_str).collect()));
    println!("{border}");
}

fn print_usage() {
    println!(
        r#"gemini-cli: Gemini API test utility

USAGE:
    gemini-cli [--config <file.yaml>] <COMMAND>

COMMANDS:
    test <prompt> [--model <model>]   Send a prompt and print content, usage and cost
    cache-clear [key]                 Forget one cached response, or flush the cache
    version                           Show version information
    help                              Show this help message

ENVIRONMENT:
    GEMINI_API_KEY, GEMINI_BASE_URL, GEMINI_DEFAULT_MODEL, GEMINI_ENABLE_CACHE,
    GEMINI_CACHE_STORE, GEMINI_CACHE_PATH, ...   override the configuration file
    RUST_LOG                                     log filter"#
    );
}
