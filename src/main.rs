use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::style::Stylize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use ollama_playground::debate::{SELF_DRIVING_DILEMMA, SOCIAL_MEDIA_TOPIC};
use ollama_playground::tools::{react_toolkit, PythonReplConfig};
use ollama_playground::{
    init_tracing, prompt_vars, AgentExecutor, AppConfig, ChatOptions, ChatPromptTemplate,
    ConsoleHook, ConversationChain, Debate, DebateAgent, EthicsDebate, LanguageModel, LlmChain,
    LogFormat, Message, OllamaClient, PlaygroundError, Role,
};

/// Prompt chains, a ReAct agent and debates against a local Ollama server
#[derive(Parser, Debug)]
#[command(name = "playground")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ollama server, e.g. http://192.168.1.149:11434
    #[arg(long, global = true)]
    host: Option<String>,

    /// Model name, e.g. llama3.2:latest
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(short, long, global = true)]
    temperature: Option<f64>,

    #[arg(long, value_enum, default_value_t = LogFormatArg::Pretty, global = true)]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the models installed on the server
    Models,
    /// Ask for the primary benefit of a technology
    Chain {
        #[arg(long, default_value = "Docker containers")]
        topic: String,
    },
    /// Three-sentence summary of a topic
    Summarize {
        #[arg(long, default_value = "LangChain + Ollama integration")]
        topic: String,
    },
    /// Translate an English sentence to French
    Translate {
        #[arg(default_value = "I love programming.")]
        text: String,
    },
    /// Answer questions with the ReAct tool-using agent
    React {
        queries: Vec<String>,
        /// Interpreter used by the python_repl tool
        #[arg(long, default_value = "python3")]
        python: String,
    },
    /// Optimist vs Pessimist debate with running histories
    Debate {
        #[arg(long)]
        turns: Option<usize>,
        #[arg(long, default_value = SOCIAL_MEDIA_TOPIC)]
        topic: String,
    },
    /// Kantian vs Utilitarian debate on the self-driving car dilemma
    Ethics {
        #[arg(long)]
        rounds: Option<usize>,
    },
    /// Interactive conversation with buffered memory
    Chat,
}

const DEFAULT_QUERIES: [&str; 2] = [
    "What is the length of the word 'onomatopoeia' and what is 12 * 12?",
    "what are the first 5 prime numbers?",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    // Errors are ignored - the file is optional. Loaded first so RUST_LOG from .env applies.
    let _ = dotenvy::dotenv();
    init_tracing(match args.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Json => LogFormat::Json,
    });

    let mut cfg = match &args.config {
        Some(path) => AppConfig::from_env_or_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AppConfig::from_env(),
    };
    if let Some(host) = &args.host {
        cfg.server.base_url = host.clone();
    }
    if let Some(model) = &args.model {
        cfg.model.name = model.clone();
    }
    if let Some(temperature) = args.temperature {
        cfg.model.temperature = Some(temperature);
        cfg.debate.temperature = temperature;
    }

    let client = OllamaClient::from_config(&cfg).context("building Ollama client")?;
    info!(host = %client.base_url(), model = %client.model(), "initialized model client");
    let client = Arc::new(client);

    let outcome = match args.command {
        Command::Models => {
            list_models(&client).await;
            Ok(())
        }
        Command::Chain { topic } => run_chain(client.clone(), &topic).await,
        Command::Summarize { topic } => run_summary(client.clone(), &topic).await,
        Command::Translate { text } => run_translate(client.as_ref(), &cfg, &text).await,
        Command::React { queries, python } => run_react(client.clone(), &cfg, queries, python).await,
        Command::Debate { turns, topic } => {
            run_debate(client.as_ref(), &cfg, turns.unwrap_or(cfg.debate.max_turns), &topic).await
        }
        Command::Ethics { rounds } => {
            run_ethics(client.as_ref(), &cfg, rounds.unwrap_or(cfg.debate.rounds)).await
        }
        Command::Chat => run_chat(client.clone()).await,
    };

    if let Err(err) = outcome {
        report_error(&err, client.model());
        std::process::exit(1);
    }
    println!("\nScript finished.");
    Ok(())
}

fn report_error(err: &PlaygroundError, model: &str) {
    eprintln!("\nAn error occurred: {err}");
    if err.is_connectivity() {
        eprintln!("Please ensure Ollama is running and the model '{model}' is available.");
        eprintln!("You can pull the model with: 'ollama pull {model}'");
    }
}

fn banner() -> String {
    "=".repeat(30)
}

async fn list_models(client: &OllamaClient) {
    match client.list_models().await {
        Ok(models) if !models.is_empty() => {
            println!("Available Ollama models:");
            for model in models {
                println!("- {}", model.name);
            }
        }
        Ok(_) => println!("No Ollama models found or an error occurred."),
        Err(err) => {
            if matches!(err, PlaygroundError::Unreachable { .. }) {
                eprintln!(
                    "Error: Could not connect to Ollama server at {}. Ensure Ollama is running and accessible.",
                    client.base_url()
                );
            } else {
                eprintln!("An error occurred while fetching models: {err}");
            }
            println!("No Ollama models found or an error occurred.");
        }
    }
}

async fn run_chain(client: Arc<OllamaClient>, topic: &str) -> ollama_playground::Result<()> {
    let prompt = ChatPromptTemplate::from_messages([
        (Role::System, "You are a helpful assistant who provides concise answers."),
        (
            Role::User,
            "What is the primary benefit of using {topic} in software development?",
        ),
    ])?;
    let chain = LlmChain::new(prompt, client);
    let response = chain.invoke(&prompt_vars! { "topic" => topic }).await?;

    println!("\n{}", banner());
    println!("Query: What is the primary benefit of using {topic} in software development?");
    println!("\nResponse:\n{response}");
    println!("{}", banner());
    Ok(())
}

async fn run_summary(client: Arc<OllamaClient>, topic: &str) -> ollama_playground::Result<()> {
    let prompt = ChatPromptTemplate::from_template(
        "Write a concise, friendly 3-sentence summary about {topic}.",
    )?;
    let output = LlmChain::new(prompt, client).run(topic).await?;

    println!("\n=== Prompt chain example ===");
    println!("Input: {topic}");
    println!("Output: {output}");
    Ok(())
}

async fn run_translate(
    model: &OllamaClient,
    cfg: &AppConfig,
    text: &str,
) -> ollama_playground::Result<()> {
    let messages = [
        Message::system(
            "You are a helpful assistant that translates English to French. Translate the user sentence.",
        ),
        Message::user(text),
    ];
    let options = ChatOptions::default().with_temperature(cfg.model.temperature.unwrap_or(0.0));
    let reply = model.complete_chat(&messages, &options).await?;
    println!("{reply}");
    Ok(())
}

async fn run_react(
    client: Arc<OllamaClient>,
    cfg: &AppConfig,
    queries: Vec<String>,
    python: String,
) -> ollama_playground::Result<()> {
    let tools = react_toolkit(PythonReplConfig {
        interpreter: python,
        ..PythonReplConfig::default()
    });
    let executor = AgentExecutor::new(client, tools)?
        .with_max_iterations(cfg.agent.max_iterations)
        .with_handle_parsing_errors(cfg.agent.handle_parsing_errors)
        .with_options(ChatOptions {
            temperature: Some(cfg.model.temperature.unwrap_or(0.0)),
            stop: Vec::new(),
        })
        .with_hook(Arc::new(ConsoleHook));

    let queries = if queries.is_empty() {
        DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect()
    } else {
        queries
    };

    for (index, query) in queries.iter().enumerate() {
        println!("\n--- Running Agent (Example {}) ---", index + 1);
        println!("\n> Entering new AgentExecutor chain...");
        let run = executor.invoke(query.as_str()).await?;
        println!("\n{}", banner());
        println!("Query: {query}");
        println!("\nFinal Answer: {}", run.output);
        println!("{}", banner());
    }
    Ok(())
}

async fn run_debate(
    model: &OllamaClient,
    cfg: &AppConfig,
    turns: usize,
    topic: &str,
) -> ollama_playground::Result<()> {
    let mut debate = Debate::new(
        DebateAgent::new("Optimist", ollama_playground::debate::OPTIMIST_PERSONA),
        DebateAgent::new("Pessimist", ollama_playground::debate::PESSIMIST_PERSONA),
    )
    .with_max_turns(turns)
    .with_options(ChatOptions::default().with_temperature(cfg.debate.temperature));
    let first = debate.first().name().to_string();

    println!("\n--- Starting Debate ---");
    println!("Topic: {topic}");
    println!("{}", banner());

    debate
        .run(model, topic, |turn| {
            if turn.speaker == first {
                println!("{}", format!("{}: {}\n", turn.speaker, turn.statement).green());
            } else {
                println!("{}: {}\n", turn.speaker, turn.statement);
            }
        })
        .await?;

    println!("{}", banner());
    println!("Debate finished.");
    println!("\n--- Final Histories (for context) ---");
    for agent in [debate.first(), debate.second()] {
        println!("\n{}'s History:", agent.name());
        for message in agent.history().iter() {
            println!("[{:?}] {}", message.role, message.content);
        }
    }
    Ok(())
}

async fn run_ethics(model: &OllamaClient, cfg: &AppConfig, rounds: usize) -> ollama_playground::Result<()> {
    let debate = EthicsDebate::kantian_vs_utilitarian()?
        .with_rounds(rounds)
        .with_options(ChatOptions::default().with_temperature(cfg.debate.temperature));

    println!("Topic: {SELF_DRIVING_DILEMMA}\n");
    println!("--- DEBATE START ---");
    debate
        .run(model, SELF_DRIVING_DILEMMA, |turn| {
            println!("{} [Round {}]:\n{}\n", turn.speaker, turn.round, turn.statement);
        })
        .await?;
    println!("--- DEBATE END ---");
    Ok(())
}

async fn run_chat(client: Arc<OllamaClient>) -> ollama_playground::Result<()> {
    let mut chat = ConversationChain::new(client)?;
    println!("\n=== Conversation CLI ===");
    println!("Type messages. Enter 'exit' or Ctrl-D to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            println!("\nExiting.");
            break;
        };
        let user = line.trim();
        if user.is_empty() {
            continue;
        }
        if matches!(user.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }
        let reply = chat.predict(user).await?;
        println!("Assistant: {reply}");
    }
    Ok(())
}
