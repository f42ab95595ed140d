//! Demo entry point: the same commands as the main CLI, always on the
//! deterministic local runtime. No credentials or network required.

use anyhow::Result;
use clap::{Parser, Subcommand};
use insight_crew::config::{RuntimeMode, Settings};
use insight_crew::Coordinator;
use insight_crew_sdk::{log_info, log_step_complete, log_step_start};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "insight-demo", version, about = "Local demo of the multi-agent analysis assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a data file
    Analyze {
        /// Path to a CSV file
        file_path: String,
    },
    /// Run market research on a query
    Research {
        /// Research query
        query: String,
    },
    /// Generate a sample report
    Report {
        /// Report title
        title: String,
    },
    /// Run the full planned workflow for a request
    Workflow {
        /// Free-text request
        request: String,
        /// Optional data file to analyze first
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

    let settings = Settings {
        runtime: RuntimeMode::Local,
        ..Settings::default()
    };
    log_info!("{} demo (local runtime)", settings.app_name);

    let coordinator = Coordinator::from_settings(settings);
    if let Err(e) = run_command(&coordinator, cli.command).await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run_command(coordinator: &Coordinator, command: Command) -> Result<()> {
    match command {
        Command::Analyze { file_path } => {
            log_step_start!(1, "Data Analysis", format!("Analyzing {}", file_path));
            let response = coordinator
                .data_analyst
                .analyze_file(&file_path, "comprehensive")
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            log_step_complete!(1);
        }

        Command::Research { query } => {
            log_step_start!(1, "Market Research", format!("Researching {}", query));
            let response = coordinator
                .research
                .conduct_market_research(
                    &query,
                    &["Market Size".to_string(), "Trends".to_string()],
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            log_step_complete!(1);
        }

        Command::Report { title } => {
            log_step_start!(1, "Report Generation", format!("Creating {}", title));
            let response = coordinator
                .report_generator
                .create_comprehensive_report(
                    &title,
                    "Sample analysis results",
                    "Sample research findings",
                )
                .await?;
            println!("{}", response.result);
            log_step_complete!(1);
        }

        Command::Workflow { request, data_file } => {
            log_step_start!(1, "Workflow", format!("Processing: {}", request));
            let result = match data_file {
                // A data file routes through the ad-hoc pipeline so the
                // analysis feeds the report directly
                Some(path) => coordinator.execute_workflow(&request, Some(&path)).await?,
                None => coordinator.process_complex_request(&request, &[]).await?,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
            log_step_complete!(1);
        }

        Command::TestAll => {
            run_all_tests(coordinator).await?;
        }

        Command::Status => {
            let mut status = coordinator.settings().status_snapshot();
            status["agents"] = json!(["data_analyst", "research", "report_generator"]);
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}

/// Write a small fixture dataset for the self-test command
fn write_sample_csv() -> Result<std::path::PathBuf> {
    let path = std::env::temp_dir().join("insight_demo_sample_data.csv");
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
            println!("\x1b[33m⚠ {}: FAIL\x1b[0m", name);
        }
    }
    println!("\nTotal: {}/{} tests passed", passed, results.len());

    if passed == results.len() {
        Ok(())
    } else {
        anyhow::bail!("{} test(s) failed", results.len() - passed)
    }
}
