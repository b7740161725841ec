mod common;

use clap::Parser;
use incubator_ml::{
    HfInferenceConfig, HfInferenceRecognizer, TextRecognizer,
    hf_inference::{DEFAULT_ENDPOINT, DEFAULT_MODEL},
};
use secrecy::SecretString;

#[derive(Parser)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    input: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::init_tracing();

    let cli = Cli::parse();
    let image = image::open(&cli.input)?;

    let recognizer = HfInferenceRecognizer::new(&HfInferenceConfig {
        endpoint: cli.endpoint,
        model: cli.model,
        token: cli.token.map(SecretString::from),
        ..Default::default()
    })?;
    let output = recognizer.recognize(&image).await?;

    println!("{output}");

    Ok(())
}
