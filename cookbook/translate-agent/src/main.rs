//! Translates a sentence to French with a single system-prompted chat call.
//!
//! Honors `OLLAMA_URL`/`OLLAMA_HOST` and `OLLAMA_MODEL`.

use ollama_playground::{
    init_tracing, AppConfig, ChatOptions, LanguageModel, LogFormat, Message, OllamaClient,
};

#[tokio::main]
async fn main() -> ollama_playground::Result<()> {
    init_tracing(LogFormat::Pretty);

    let sentence = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let sentence = if sentence.is_empty() {
        "I love programming.".to_string()
    } else {
        sentence
    };

    let client = OllamaClient::from_config(&AppConfig::from_env())?;
    let messages = [
        Message::system(
            "You are a helpful assistant that translates English to French. Translate the user sentence.",
        ),
        Message::user(sentence),
    ];
    let reply = client
        .complete_chat(&messages, &ChatOptions::default().with_temperature(0.0))
        .await?;

    println!("{reply}");
    Ok(())
}
