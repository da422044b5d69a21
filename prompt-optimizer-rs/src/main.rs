// prompt-optimizer-rs/src/main.rs
// Command-line driver: prompt-optimizer <test-cases.json> [task description...]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use llm_client::OpenAiCompletionClient;
use prompt_optimizer::{
    validate_test_cases, CancellationFlag, LoggingObserver, OptimizerConfig, PromptOptimizer, TestCase,
};

fn load_test_cases(path: &Path) -> anyhow::Result<Vec<TestCase>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cases: Vec<TestCase> =
        serde_json::from_str(&raw).with_context(|| format!("parsing test cases from {}", path.display()))?;
    validate_test_cases(&cases)?;
    Ok(cases)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config_rs::load_env();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        bail!("usage: prompt-optimizer <test-cases.json> [task description...]");
    };
    let task_description = args.collect::<Vec<_>>().join(" ");

    let test_cases = load_test_cases(&path)?;
    log::info!("Loaded {} test cases from {}", test_cases.len(), path.display());

    let client = OpenAiCompletionClient::from_env().context("configuring the completion client")?;
    let config = OptimizerConfig::from_env()?;

    let cancellation = CancellationFlag::new();
    {
        let cancellation = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupt received; stopping after the current iteration");
                cancellation.cancel();
            }
        });
    }

    let optimizer = PromptOptimizer::new(Arc::new(client), config)
        .with_task_description(task_description)
        .with_observer(Arc::new(LoggingObserver))
        .with_cancellation(cancellation);

    let result = optimizer.optimize(&test_cases).await?;

    println!("{}", serde_json::to_string_pretty(&result.report())?);

    Ok(())
}
