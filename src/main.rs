use std::path::PathBuf;

use clap::Parser;

use mleval::{EvaluationConfig, ModelEvaluator};

/// Regression model evaluation pipeline stage
#[derive(Debug, Parser)]
#[command(name = "mleval", version, about)]
struct Cli {
    /// Path to the evaluation stage configuration (YAML)
    #[arg(short, long, default_value = "config/evaluation.yaml")]
    config: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mleval=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        log::error!("評価ステージが失敗しました: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> mleval::Result<()> {
    let config = EvaluationConfig::from_yaml(&cli.config)?;
    let evaluator = ModelEvaluator::new(config);
    let report = evaluator.run()?;
    log::info!(
        "評価が完了しました: rmse={:.6} mae={:.6} r2={:.6}",
        report.rmse,
        report.mae,
        report.r2
    );
    Ok(())
}
