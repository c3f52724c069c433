use clap::Parser;
use product_describer::utils::error::ErrorSeverity;
use product_describer::utils::{logger, validation::Validate};
use product_describer::{
    CliConfig, DescriptionEngine, GeminiClient, LocalStorage, ModelConfig, Result, TomlConfig,
};
use std::io::Write;

fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting product-describer");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = run(&config) {
        tracing::error!(
            "❌ Generation failed: {} (Severity: {:?})",
            e,
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

fn run(config: &CliConfig) -> Result<()> {
    config.validate()?;

    let file_config = match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading model configuration from: {}", path);
            let file_config = TomlConfig::from_file(path)?;
            file_config.validate()?;
            Some(file_config)
        }
        None => None,
    };

    let model_config = ModelConfig::resolve(
        file_config.as_ref().map(|c| &c.model),
        config.model.as_deref(),
        config.endpoint.as_deref(),
    )?;
    tracing::debug!("Model config: {:?}", model_config);
    tracing::info!("Using model {}", model_config.name);

    let client = GeminiClient::new(model_config)?;
    let engine = DescriptionEngine::new(LocalStorage::new("."), client);
    let job = config.to_job()?;

    let live = config.stream;
    let result = engine.run(job, |segment| {
        if live {
            let mut out = std::io::stdout().lock();
            // 輸出失敗 (例如 stdout 已關閉) 不中斷生成
            let _ = out.write_all(segment.as_bytes());
            let _ = out.flush();
        }
    })?;

    let mut out = std::io::stdout().lock();
    if config.json {
        serde_json::to_writer_pretty(&mut out, &result)?;
        writeln!(out)?;
    } else {
        if !live {
            for segment in &result.segments {
                out.write_all(segment.as_bytes())?;
            }
        }
        writeln!(out)?;
    }

    tracing::info!("✅ Descriptions generated successfully");
    Ok(())
}
