//! Report assembly.
//!
//! Builds a structured document from named sections and renders it as
//! Markdown or standalone HTML. Section order is the order of insertion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<ReportSection>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            generated_at: Utc::now(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, heading: impl Into<String>, body: impl Into<String>) {
        self.sections.push(ReportSection {
            heading: heading.into(),
            body: body.into(),
        });
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# {}\n\n*Generated: {}*\n",
            self.title,
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );
        for section in &self.sections {
            out.push_str(&format!("\n## {}\n\n{}\n", section.heading, section.body));
        }
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = format!(
            "<!DOCTYPE html>\n<html>\n<head><title>{}</title></head>\n<body>\n<h1>{}</h1>\n<p><em>Generated: {}</em></p>\n",
            escape_html(&self.title),
            escape_html(&self.title),
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );
        for section in &self.sections {
            out.push_str(&format!(
                "<h2>{}</h2>\n<p>{}</p>\n",
                escape_html(&section.heading),
                escape_html(&section.body).replace('\n', "<br>\n")
            ));
        }
        out.push_str("</body>\n</html>\n");
        out
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Assemble the standard business-report layout from its parts. Empty
/// parts are skipped rather than rendered as empty sections.
pub fn assemble_business_report(
    title: &str,
    executive_summary: &str,
    data_analysis: &str,
    market_research: &str,
    recommendations: &str,
    conclusion: &str,
) -> ReportDocument {
    let mut report = ReportDocument::new(title);
    for (heading, body) in [
        ("Executive Summary", executive_summary),
        ("Data Analysis", data_analysis),
        ("Market Research", market_research),
        ("Recommendations", recommendations),
        ("Conclusion", conclusion),
    ] {
        if !body.trim().is_empty() {
            report.add_section(heading, body.trim());
        }
    }
    report
}
