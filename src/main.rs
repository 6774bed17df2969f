//! CLI `probus`
//!
//! Подписывается на темы удалённого процесса модели и печатает
//! уведомления, а также выполняет одноразовые запросы к нему.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use probus::{
    client::ModelClient,
    config::Settings,
    dispatcher::Dispatcher,
    logging::init_logging,
    pubsub::Notification,
    StackError,
};
use tracing::{error, info};
use url::Url;

#[derive(Parser)]
#[command(name = "probus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("PROBUS_GIT_COMMIT"), ", built ", env!("PROBUS_BUILD_TIME"), ")"
))]
#[command(about = "Topic-based pub/sub client for a remote model process", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Файл конфигурации (TOML, YAML или JSON)
    #[arg(short, long, env = "PROBUS_CONFIG")]
    config: Option<PathBuf>,
    /// Базовый URL удалённого процесса, важнее конфигурации
    #[arg(long)]
    base_url: Option<Url>,
    /// Подробный вывод (debug)
    #[arg(short, long)]
    verbose: bool,
    /// Только предупреждения и ошибки
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Подписаться на темы и печатать уведомления до Ctrl-C
    Watch {
        /// Тема подписки; можно указать несколько раз
        #[arg(short, long = "topic")]
        topics: Vec<String>,
        /// Подписаться также на канал вывода
        #[arg(short, long)]
        output: bool,
    },
    /// Выполнить команду в удалённом процессе и напечатать ответ
    Command { text: String },
    /// Запустить модель или файл
    Run {
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Напечатать список файлов проекта
    Files,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `PROBUS_LOG_*` уже учтены; флаги ниже важнее окружения.
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(base_url) = cli.base_url.clone() {
        settings.base_url = base_url;
    }
    if cli.verbose {
        settings.logging.level = "debug".to_string();
    } else if cli.quiet {
        settings.logging.level = "warn".to_string();
    }

    let logging = init_logging(settings.logging.clone()).context("Failed to initialize logging")?;
    info!(base_url = %settings.base_url, "Starting probus");

    let result = run(cli.command, &settings).await;
    if let Err(err) = &result {
        report_failure(err);
    }
    logging.shutdown();
    result
}

/// Логирует статус-код ошибки диспетчера или клиента.
fn report_failure(err: &anyhow::Error) {
    match err.downcast_ref::<StackError>() {
        Some(stack) => {
            let code = stack.status_code();
            error!(
                status = %code,
                retryable = code.is_retryable(),
                error = %stack,
                "Command failed"
            );
        }
        None => error!(error = %err, "Command failed"),
    }
}

async fn run(
    command: Commands,
    settings: &Settings,
) -> Result<()> {
    let dispatcher = Arc::new(Dispatcher::connect(&settings.dispatch())?);
    let client = ModelClient::new(settings.base_url.clone(), Arc::clone(&dispatcher));

    match command {
        Commands::Watch { topics, output } => watch(&dispatcher, topics, output).await,
        Commands::Command { text } => {
            let reply = client.issue_command(&text).await?;
            print_reply(&reply);
            Ok(())
        }
        Commands::Run { file } => {
            let reply = match file {
                Some(path) => client.exec_file(&path).await?,
                None => client.run_model().await?,
            };
            print_reply(&reply);
            Ok(())
        }
        Commands::Files => {
            let files = client.files().await?;
            println!("{}", serde_json::to_string_pretty(&files)?);
            Ok(())
        }
    }
}

async fn watch(
    dispatcher: &Dispatcher,
    topics: Vec<String>,
    output: bool,
) -> Result<()> {
    let output = output || topics.is_empty();
    if output {
        dispatcher.add_listener(dispatcher.output_topic().clone(), print_notification);
    }
    for topic in topics {
        dispatcher.add_listener(topic, print_notification);
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    let output_state = dispatcher.output_state();
    let publisher_state = dispatcher.publisher_state();
    info!(
        output = %output_state.state,
        publisher = %publisher_state.state,
        "Stopping watch"
    );
    Ok(())
}

fn print_notification(notification: &Notification) {
    match notification {
        Notification::Output(text) => print!("{text}"),
        Notification::Published(envelope) => println!("{}", envelope.to_value()),
        Notification::Refresh => println!("(refresh)"),
    }
}

fn print_reply(reply: &str) {
    if !reply.is_empty() {
        println!("{}", reply.trim_end());
    }
}
