use contextual_chatbot::{
    config::ChatConfig,
    inference::{HfInferenceClient, MockGenerator, TextGenerator},
    session::ChatSession,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; keep the transcript clean unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = ChatConfig::from_env();

    info!(
        model = %config.model_id,
        window = config.window_size,
        "Starting chatbot"
    );

    println!("Loading model: {}...", config.model_id);

    let generator: Box<dyn TextGenerator> = if config.api_token.is_empty() {
        warn!("HF_API_TOKEN not set, falling back to the mock generator");
        eprintln!("HF_API_TOKEN not set in .env - replies will be canned.");
        Box::new(MockGenerator)
    } else {
        Box::new(HfInferenceClient::new(
            &config.model_id,
            config.api_token.clone(),
            &config.api_base,
        ))
    };

    println!("Model ready.\n");

    let mut session = ChatSession::new(&config, generator);

    match session.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("\nAn error occurred: {}", e);
            eprintln!("Exiting chatbot. Goodbye!");
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
