//! Data analyst agent: file profiling, dataset comparison, report inputs,
//! and simple trend forecasting.

use anyhow::Result;
use insight_crew_sdk::{AgentKind, AgentRuntime};
use serde_json::json;
use std::sync::Arc;

use super::{AgentCore, AgentResponse};

pub struct DataAnalystAgent {
    core: AgentCore,
}

impl DataAnalystAgent {
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        Self {
            core: AgentCore::new(runtime, AgentKind::DataAnalyst),
        }
    }

    /// Analyze a data file and return structured insights
    pub async fn analyze_file(
        &self,
        file_path: &str,
        analysis_type: &str,
    ) -> Result<AgentResponse> {
        let prompt = format!(
            "Please analyze the data file at: {}\n\n\
             Perform a {} analysis including:\n\
             1. Load the file and examine its structure\n\
             2. Check data quality (missing values, data types)\n\
             3. Generate summary statistics\n\
             4. Identify key patterns and trends\n\
             5. Detect any anomalies or outliers\n\
             6. Provide actionable insights and recommendations\n\n\
             Return a structured analysis with clear findings.",
            file_path, analysis_type
        );
        self.core
            .invoke(
                "analyze_file",
                format!("Analyzing {}", file_path),
                prompt,
                json!({ "file_path": file_path, "analysis_type": analysis_type }),
            )
            .await
    }

    /// Compare two datasets and describe what changed between them
    pub async fn compare_datasets(&self, file_a: &str, file_b: &str) -> Result<AgentResponse> {
        let prompt = format!(
            "Compare the following two datasets:\n\
             1. Dataset 1: {}\n\
             2. Dataset 2: {}\n\n\
             Please:\n\
             1. Load both datasets\n\
             2. Compare their structures (columns, data types, row counts)\n\
             3. Compare statistical properties of numerical columns\n\
             4. Identify significant differences in the data\n\
             5. Provide insights on what changed between the datasets\n\n\
             Return a detailed comparison report.",
            file_a, file_b
        );
        self.core
            .invoke(
                "compare_datasets",
                format!("Comparing {} with {}", file_a, file_b),
                prompt,
                json!({ "file_a": file_a, "file_b": file_b }),
            )
            .await
    }

    /// Produce analysis content shaped for inclusion in a report
    pub async fn generate_report_data(
        &self,
        file_path: &str,
        report_sections: &[String],
    ) -> Result<AgentResponse> {
        let sections: String = report_sections
            .iter()
            .map(|s| format!("- {}\n", s))
            .collect();
        let prompt = format!(
            "Analyze the data file at {} and generate content for a report with the following sections:\n\n\
             {}\n\
             For each section:\n\
             1. Provide relevant data analysis\n\
             2. Include key statistics and metrics\n\
             3. Identify important findings\n\
             4. Write clear, concise insights\n\n\
             Format the output so it can be easily used in a report.",
            file_path, sections
        );
        self.core
            .invoke(
                "generate_report_data",
                format!("Generating report data from {}", file_path),
                prompt,
                json!({ "file_path": file_path, "sections": report_sections }),
            )
            .await
    }

    /// Segment a dataset by one column, optionally profiling a target
    /// metric within each segment
    pub async fn perform_segmentation(
        &self,
        file_path: &str,
        segment_column: &str,
        target_column: Option<&str>,
    ) -> Result<AgentResponse> {
        let target_phrase = match target_column {
            Some(column) => format!("analyzing '{}'", column),
            None => "analyzing all relevant metrics".to_string(),
        };
        let prompt = format!(
            "Perform segmentation analysis on the data file at {}.\n\n\
             Segment the data by: {}\n\
             Focus on {} across segments.\n\n\
             Please:\n\
             1. Load the data and create segments based on the specified column\n\
             2. Calculate segment sizes and proportions\n\
             3. Analyze key metrics for each segment\n\
             4. Identify significant differences between segments\n\
             5. Rank segments by importance\n\
             6. Provide actionable insights for each segment\n\n\
             Return a comprehensive segmentation analysis.",
            file_path, segment_column, target_phrase
        );
        self.core
            .invoke(
                "perform_segmentation",
                format!("Segmenting {} by {}", file_path, segment_column),
                prompt,
                json!({
                    "file_path": file_path,
                    "segment_column": segment_column,
                    "target_column": target_column,
                }),
            )
            .await
    }

    /// Project a metric forward a number of periods
    pub async fn forecast_trends(&self, metric: &str, periods: u64) -> Result<AgentResponse> {
        let prompt = format!(
            "Analyze trends and provide forecasts for the metric: {}\n\
             Forecast periods: {}\n\n\
             Please:\n\
             1. Analyze historical trends for the metric\n\
             2. Identify seasonality, cycles, or patterns\n\
             3. Calculate growth rates and trend directions\n\
             4. Provide simple forecasts for the next {} periods\n\
             5. Identify potential risks or opportunities in the trends\n\n\
             Note: Use simple trend analysis and extrapolation methods suitable for business planning.",
            metric, periods, periods
        );
        self.core
            .invoke(
                "forecast_trends",
                format!("Forecasting {} over {} periods", metric, periods),
                prompt,
                json!({ "metric": metric, "periods": periods }),
            )
            .await
    }
}
