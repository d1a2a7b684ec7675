use dotenv::dotenv;
use sglang_lm::{AdditionalPrompt, GenerateOptions, LanguageModel, lm};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Reads SGLANG_API_URL, e.g. http://127.0.0.1:30000/v1
    let model = lm::model("meta-llama/Llama-3.1-8B-Instruct")
        .max_tokens(512)
        .build()?;

    let output = model
        .generate(
            "How to go to Shanghai from Beijing?".into(),
            GenerateOptions::new()
                .additional_prompt(AdditionalPrompt::Answer)
                .num_return_sequences(2)
                .temperature(0.7)
                .build(),
        )
        .await?;

    for (i, text) in output.text.iter().enumerate() {
        println!("--- choice {i} ---\n{text}");
    }
    println!("first choice token logprobs: {:?}", output.log_prob.first());

    Ok(())
}
