use anyhow::Result;
use std::{env, io::Write, process::ExitCode};
use waste_classifier::{ClassificationResult, Config, GeminiClient};

fn print_json(result: &ClassificationResult) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string(result)?)?;
    stdout.flush()?;
    Ok(())
}

fn exit_code(result: &ClassificationResult) -> ExitCode {
    if result.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // stdout carries the JSON result, so logs go to stderr (default: warn; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let Some(image_path) = env::args_os().nth(1) else {
        let result = ClassificationResult::failure("Image path required");
        print_json(&result)?;
        return Ok(exit_code(&result));
    };

    let client = GeminiClient::new(config);
    let result = waste_classifier::classify(&client, &image_path).await;
    print_json(&result)?;

    Ok(exit_code(&result))
}
