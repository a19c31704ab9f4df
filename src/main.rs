use clap::Parser;
use data_report::utils::{logger, validation::Validate};
use data_report::{CliConfig, LocalStorage, ReportEngine, ReportPipeline};

fn main() {
    let cli = CliConfig::parse();

    logger::init_logger(cli.verbose, logger::LogFormat::from_flag(cli.json_logs));

    tracing::info!("Starting data-report CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let pipeline = ReportPipeline::new(LocalStorage::default(), config);
    let engine = ReportEngine::new(pipeline);

    match engine.run_with(|preview| println!("{}", preview)) {
        Ok(summary) => {
            println!("✅ Report Generated: {}", summary.output_path);
        }
        Err(e) => {
            tracing::error!("❌ Report generation failed: {} (Category: {:?})", e, e.category());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }
}
