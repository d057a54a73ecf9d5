use clap::Parser;
use listing_router::config::cli::{Command, DirectoryCommand, ProcessArgs};
use listing_router::core::{DirectoryStore, EditableDirectoryStore};
use listing_router::domain::model::parse_locations;
use listing_router::utils::error::ErrorSeverity;
use listing_router::utils::{logger, validation::Validate};
use listing_router::{
    CliConfig, EtlEngine, InputSource, LocalStorage, RouterConfig, RouterError, RoutingPipeline,
    RunRequest, RunStatus,
};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    // 載入並驗證配置
    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let outcome = match &cli.command {
        Command::Process(args) => process(args, config, cli.monitor).await,
        Command::Directory(command) => directory(command, &config).await,
    };

    if let Err(e) = outcome {
        exit_with(&e);
    }
    Ok(())
}

async fn process(args: &ProcessArgs, config: RouterConfig, monitor: bool) -> listing_router::Result<()> {
    args.validate()?;

    let run_date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let inputs = args
        .inputs
        .iter()
        .map(|path| InputSource::Path(PathBuf::from(path)))
        .collect();
    let mut request = RunRequest::new(inputs, run_date);
    if !args.agents.is_empty() {
        request = request.with_selection(args.agents.clone());
    }

    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::from_config(&config);
    let directory = config.directory_store()?;
    let pipeline = RoutingPipeline::new(storage, directory, config, request);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor);

    let report = engine.run().await?;

    for failure in &report.file_failures {
        eprintln!("⚠️ {}", failure);
    }
    if report.skipped_rows > 0 {
        eprintln!("⚠️ {} rows skipped: too few columns", report.skipped_rows);
    }
    for agent in &report.unknown_agents {
        eprintln!("⚠️ BDE '{}' not found in directory", agent);
    }

    match report.status {
        RunStatus::Completed => {
            println!("🎉 Success! {} files created.", report.files.len());
            for count in report.per_agent.iter().filter(|c| c.rows > 0) {
                println!("  👤 {}: {} rows", count.agent, count.rows);
            }
            if let Some(path) = &report.archive_path {
                tracing::info!("📁 Output saved to: {}", path);
                println!("📁 Output saved to: {}", path);
            }
        }
        RunStatus::Empty => {
            println!("No matching data found. Check locations and the master files.");
        }
    }

    Ok(())
}

async fn directory(command: &DirectoryCommand, config: &RouterConfig) -> listing_router::Result<()> {
    match command {
        DirectoryCommand::List => {
            let store = config.directory_store()?;
            let directory = store.load().await?;
            println!("📡 {} ({} BDEs)", store.describe(), directory.len());
            for agent in directory.agents() {
                println!("👤 {} ({} locs): {}", agent.name, agent.locations.len(), agent.locations.join(", "));
            }
        }
        DirectoryCommand::Add { name, locations } => {
            let store = editable_store(config)?;
            let directory = store.upsert(name, parse_locations(locations)).await?;
            println!("✅ Saved {} ({} BDEs in directory)", name.trim(), directory.len());
        }
        DirectoryCommand::Remove { name } => {
            let store = editable_store(config)?;
            if store.remove(name).await? {
                println!("🗑️ Removed {}", name.trim());
            } else {
                println!("BDE '{}' was not in the directory", name.trim());
            }
        }
    }
    Ok(())
}

fn editable_store(config: &RouterConfig) -> listing_router::Result<listing_router::LocalDirectory> {
    if config.directory.source != listing_router::config::DirectorySourceKind::Local {
        return Err(RouterError::ConfigError {
            message: "directory edits need [directory] source = \"local\"; edit the published sheet instead".to_string(),
        });
    }
    Ok(config.local_directory())
}

fn exit_with(e: &RouterError) -> ! {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
