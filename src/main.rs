use ads_keyword_metrics::utils::logger;
use ads_keyword_metrics::{app, CliConfig, PipelineError};
use clap::Parser;

fn report_failure(stage: &str, e: &PipelineError) -> ! {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();
    logger::init_logger(cli.verbose, cli.log_json);

    tracing::info!("Starting ads-keyword-metrics");
    tracing::debug!("CLI config: {:?}", cli);

    let monitor = cli.monitor;
    if monitor {
        tracing::info!("🔍 Process monitoring enabled");
    }

    let config = match cli.into_app_config() {
        Ok(config) => config,
        Err(e) => report_failure("Configuration", &e),
    };

    match app::run(config, ".", monitor).await {
        Ok(summary) => {
            tracing::info!(
                "✅ Run completed: {} keywords, {} rows",
                summary.keywords,
                summary.records
            );
            println!("Wrote {} ({} rows)", summary.output_path, summary.records);
        }
        Err(e) => report_failure("Keyword metrics run", &e),
    }
}
