//! Command-line entry point for the multi-agent analysis assistant.

use anyhow::Result;
use clap::{Parser, Subcommand};
use insight_crew::config::{RuntimeMode, Settings};
use insight_crew::Coordinator;
use insight_crew_sdk::{log_info, log_warning};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "insight-crew", version, about = "Multi-agent business analysis assistant")]
struct Cli {
    /// Use the deterministic local runtime instead of Claude
    #[arg(long, global = true)]
    local: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a data file
    Analyze {
        /// Path to the data file
        file_path: String,
        /// Type of analysis to perform
        #[arg(long, default_value = "comprehensive")]
        analysis_type: String,
    },
    /// Run market research on a query
    Research {
        /// Research query
        query: String,
    },
    /// Generate an executive summary for a report title
    Report {
        /// Report title
        title: String,
    },
    /// Hand a free-text request to the coordinator
    Coordinate {
        /// Coordination request
        request: String,
        /// Optional data file to fold into the workflow
        #[arg(long)]
        data_file: Option<String>,
    },
    /// Exercise every agent once and summarize the results
    TestAll,
    /// Show configuration and system status
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if cli.local {
        settings.runtime = RuntimeMode::Local;
    }

    log_info!(
        "{} v{} [{}] runtime={} model={}",
        settings.app_name,
        settings.app_version,
        settings.environment,
        settings.runtime,
        settings.model_id
    );

    let coordinator = Coordinator::from_settings(settings);
    if let Err(e) = run_command(&coordinator, cli.command).await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run_command(coordinator: &Coordinator, command: Command) -> Result<()> {
    match command {
        Command::Analyze {
            file_path,
            analysis_type,
        } => {
            log_info!("Analyzing {}", file_path);
            let response = coordinator
                .data_analyst
                .analyze_file(&file_path, &analysis_type)
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Command::Research { query } => {
            log_info!("Researching: {}", query);
            let response = coordinator
                .research
                .conduct_market_research(
                    &query,
                    &[
                        "Market Size".to_string(),
                        "Key Players".to_string(),
                        "Trends".to_string(),
                    ],
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Command::Report { title } => {
            log_info!("Generating report: {}", title);
            let sample_content = serde_json::to_string_pretty(&json!({
                "analysis": "Sample analysis results",
                "research": "Sample research findings",
                "metrics": { "revenue": 1_000_000, "growth": 15 },
            }))?;
            let response = coordinator
                .report_generator
                .create_executive_summary(&sample_content)
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Command::Coordinate { request, data_file } => {
            log_info!("Coordinating: {}", request);
            let result = coordinator
                .execute_workflow(&request, data_file.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Command::TestAll => {
            run_all_tests(coordinator).await?;
        }

        Command::Status => {
            let mut status = coordinator.settings().status_snapshot();
            status["agents"] = json!(["data_analyst", "research", "report_generator"]);
            status["workflow"] = json!(coordinator.workflow_status(None));
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}

/// Write a small fixture dataset for the self-test commands
fn write_sample_csv() -> Result<std::path::PathBuf> {
    let path = std::env::temp_dir().join("insight_crew_sample_data.csv");
    std::fs::write(
        &path,
        "month,revenue,region\njan,120,north\nfeb,135,north\nmar,150,south\n",
    )?;
    Ok(path)
}

async fn run_all_tests(coordinator: &Coordinator) -> Result<()> {
    log_info!("Running all agent tests...");
    let mut results: Vec<(&str, bool)> = Vec::new();

    let analysis_ok = match write_sample_csv() {
        Ok(path) => coordinator
            .data_analyst
            .analyze_file(&path.to_string_lossy(), "comprehensive")
            .await
            .is_ok(),
        Err(_) => false,
    };
    results.push(("Data Analysis", analysis_ok));

    let research_ok = coordinator
        .research
        .conduct_market_research("AI market trends", &["Trends".to_string()])
        .await
        .is_ok();
    results.push(("Research", research_ok));

    let report_ok = coordinator
        .report_generator
        .create_comprehensive_report("Test Report", "sample analysis", "sample research")
        .await
        .is_ok();
    results.push(("Report Generation", report_ok));

    let coordinate_ok = coordinator
        .process_complex_request("Analyze market trends and create a report", &[])
        .await
        .is_ok();
    results.push(("Coordinator", coordinate_ok));

    let mut passed = 0;
    for (name, ok) in &results {
        if *ok {
            passed += 1;
            log_info!("{}: PASS", name);
        } else {
            log_warning!("{}: FAIL", name);
        }
    }
    println!("\nTotal: {}/{} tests passed", passed, results.len());

    if passed == results.len() {
        Ok(())
    } else {
        anyhow::bail!("{} test(s) failed", results.len() - passed)
    }
}
