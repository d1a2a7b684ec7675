use dotenv::dotenv;
use sglang_lm::{LanguageModel, lm};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let model = lm::model("meta-llama/Llama-3.1-8B").build()?;

    let prefix = "Q: Why is the grass wet in the morning?\nA:";
    let contents: Vec<String> = ["because of dew", "because it is Tuesday", "because of rain"]
        .iter()
        .map(|answer| format!("{prefix} {answer}"))
        .collect();

    let scores = model.get_loglikelihood(prefix, &contents).await?;
    for (content, score) in contents.iter().zip(&scores) {
        println!("{score:>8.4}  {content}");
    }

    let actions = sglang_lm::extract_actions(prefix, &contents)?;
    let selection = model.select(prefix, &actions).await?;
    println!("most likely: {}", selection.choice);

    Ok(())
}
