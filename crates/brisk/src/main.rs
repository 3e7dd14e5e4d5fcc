//! The `brisk` command line: a chat REPL and a dictionary lookup.

#[macro_use]
extern crate tracing;

use std::error::Error as _;
use std::io::Write as _;
use std::process;
use std::time::Duration;

use brisk::{Language, Mode, ModelTable, PipelineBuilder, Session};
use brisk_core::Dictionary;
use brisk_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";

/// Answers hard questions with a reasoning model and everything else with
/// a chat model.
#[derive(Parser, Debug)]
#[command(name = "brisk", version, about, long_about = None)]
struct Cli {
    /// The API key of the OpenAI-compatible endpoint.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// The base URL of the endpoint.
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// The model answering reasoning questions.
    #[arg(long, env = "BRISK_REASONING_MODEL")]
    reasoning_model: Option<String>,

    /// The model answering everything else.
    #[arg(long, env = "BRISK_CHAT_MODEL")]
    chat_model: Option<String>,

    /// The model deciding between the two.
    #[arg(long, env = "BRISK_CLASSIFIER_MODEL")]
    classifier_model: Option<String>,

    /// The language of the replies, `en` or `zh`.
    #[arg(long, env = "BRISK_LANG", default_value_t = Language::En)]
    lang: Language,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat interactively (the default).
    Chat,
    /// Translate a word or a sentence into Chinese, defining the terms
    /// marked with `*`.
    Dict {
        /// The word or sentence to look up.
        query: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = OpenAIConfigBuilder::with_api_key(cli.api_key);
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    let model_provider = OpenAIProvider::new(config.build());

    let mut models = ModelTable::default();
    if let Some(model) = cli.reasoning_model {
        models.reasoning = model;
    }
    if let Some(model) = cli.chat_model {
        models.chat = model;
    }
    let mut builder =
        PipelineBuilder::with_model_provider(model_provider).with_models(models);
    if let Some(model) = cli.classifier_model {
        builder = builder.with_classifier_model(model);
    }
    let pipeline = builder.build();

    match cli.command {
        Some(Command::Dict { query }) => {
            if let Err(err) = lookup(pipeline.dictionary(), &query).await {
                eprintln!("{}", report(&err).red());
                process::exit(1);
            }
        }
        Some(Command::Chat) | None => {
            chat(Session::new(pipeline, cli.lang)).await;
        }
    }
}

async fn chat(mut session: Session) {
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut response = session.send_message(line);

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("🤔 Thinking...");

        // Nothing is printed before the first fragment.
        let mut next = loop {
            progress_bar.inc(1);
            let sleep = sleep(Duration::from_millis(100));
            select! {
                fragment = response.next() => break fragment,
                _ = sleep => continue,
            }
        };
        progress_bar.finish_and_clear();

        let mode = response.mode().unwrap_or_default();
        print!("{}{} ", BAR_CHAR.bright_cyan(), mode_tag(mode));

        let mut reply = String::new();
        let mut failed = false;
        while let Some(fragment) = next {
            match fragment {
                Ok(fragment) if fragment.is_marker() => {}
                Ok(fragment) => {
                    print!("{}", fragment.text.bright_white());
                    std::io::stdout().flush().ok();
                    reply.push_str(&fragment.text);
                }
                Err(err) => {
                    println!();
                    eprintln!("{}", report(&err).red());
                    failed = true;
                    break;
                }
            }
            next = response.next().await;
        }
        println!("\n");

        if !failed {
            session.record_reply(&reply);
        }
    }
}

async fn lookup(
    dictionary: Dictionary,
    query: &str,
) -> Result<(), brisk_core::Error> {
    let mut entry = dictionary.lookup(query).await?;
    while let Some(text) = entry.next().await {
        print!("{}", text?);
        std::io::stdout().flush().ok();
    }
    println!();
    Ok(())
}

/// Formats `err` followed by its causes.
fn report(err: &brisk_core::Error) -> String {
    let mut report = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        report.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    report
}

fn mode_tag(mode: Mode) -> String {
    let tag = format!("[{mode}]");
    match mode {
        Mode::Reasoning => tag.bright_magenta().to_string(),
        Mode::Chat => tag.bright_green().to_string(),
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
