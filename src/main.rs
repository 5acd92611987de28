//! studio-llm CLI binary entry point.

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use studio_llm::cli::{format_progress, ChatArgs, Cli, Commands, GenerateArgs};
use studio_llm::config::StudioConfig;
use studio_llm::provider::OllamaClient;
use studio_llm::session::ChatSession;
use studio_llm::stream::Completion;
use studio_llm::types::{GenerateRequest, GenerationOptions};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match build_client(&cli) {
        Ok(client) => match cli.command {
            Commands::Status => handle_status(&client).await,
            Commands::Models => handle_models(&client).await,
            Commands::Generate(args) => handle_generate(&client, args).await,
            Commands::Chat(args) => handle_chat(client, args).await,
            Commands::Pull(args) => handle_pull(&client, &args.model).await,
            Commands::Rm(args) => handle_rm(&client, &args.model).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn build_client(cli: &Cli) -> Result<OllamaClient, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => StudioConfig::load(Some(path.as_path()))?,
        None => StudioConfig::from_env()?,
    };
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url);
    }
    Ok(OllamaClient::from_config(&config)?)
}

async fn handle_status(client: &OllamaClient) -> CliResult {
    if !client.is_available().await {
        println!("{}: unreachable", client.base_url());
        std::process::exit(2);
    }
    let version = client.version().await?;
    println!("{}: running (ollama {version})", client.base_url());
    Ok(())
}

async fn handle_models(client: &OllamaClient) -> CliResult {
    let models = client.list_models().await?;
    if models.is_empty() {
        println!("No models installed. Try: studio-llm pull llama3.2");
        return Ok(());
    }
    for model in models {
        let modified = model
            .modified_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("{:<32} {:>10}  {modified}", model.name, model.display_size());
    }
    Ok(())
}

fn options(temperature: Option<f64>, max_tokens: Option<i32>) -> GenerationOptions {
    GenerationOptions {
        temperature,
        num_predict: max_tokens,
        ..Default::default()
    }
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    token
}

async fn handle_generate(client: &OllamaClient, args: GenerateArgs) -> CliResult {
    let request = GenerateRequest {
        model: args.model,
        prompt: args.prompt,
        system: args.system,
        images: Vec::new(),
        options: options(args.temperature, args.max_tokens),
        keep_alive: None,
    };

    let cancel = cancel_on_ctrl_c();
    let outcome = client
        .generate_with_cancel(&request, &cancel, |text| {
            print!("{text}");
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();

    if outcome.completion == Completion::Cancelled {
        eprintln!("(cancelled)");
    }
    Ok(())
}

async fn handle_chat(client: OllamaClient, args: ChatArgs) -> CliResult {
    let mut session = ChatSession::new(Arc::new(client))
        .with_options(options(args.temperature, None));
    if let Some(model) = args.model {
        session = session.with_model(model);
    }
    if let Some(system) = args.system {
        session = session.with_system(system);
    }

    eprintln!("Chatting with {}. /clear resets, /exit quits.", session.model());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/clear" => {
                session.clear();
                eprintln!("(history cleared)");
                continue;
            }
            prompt => {
                let sent = session
                    .send(prompt, |text| {
                        print!("{text}");
                        let _ = std::io::stdout().flush();
                    })
                    .await;
                println!();
                if let Err(e) = sent {
                    eprintln!("Error: {e}");
                    if let Some(hint) = e.recovery_suggestion().hint() {
                        eprintln!("  {hint}");
                    }
                }
            }
        }
    }
    Ok(())
}

async fn handle_pull(client: &OllamaClient, model: &str) -> CliResult {
    let cancel = cancel_on_ctrl_c();
    let mut last = String::new();
    client
        .pull_model_with_cancel(model, &cancel, |progress| {
            let line = format_progress(progress);
            if line != last {
                eprintln!("{line}");
                last = line;
            }
        })
        .await?;
    println!("pulled {model}");
    Ok(())
}

async fn handle_rm(client: &OllamaClient, model: &str) -> CliResult {
    client.delete_model(model).await?;
    println!("deleted {model}");
    Ok(())
}
