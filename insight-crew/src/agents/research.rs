//! Research agent: market research, competitive analysis, industry trends,
//! and fact checking.

use anyhow::Result;
use insight_crew_sdk::{AgentKind, AgentRuntime};
use serde_json::json;
use std::sync::Arc;

use super::{AgentCore, AgentResponse};

pub struct ResearchAgent {
    core: AgentCore,
}

impl ResearchAgent {
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        Self {
            core: AgentCore::new(runtime, AgentKind::Research),
        }
    }

    pub async fn conduct_market_research(
        &self,
        topic: &str,
        aspects: &[String],
    ) -> Result<AgentResponse> {
        let aspects_list: String = aspects.iter().map(|a| format!("- {}\n", a)).collect();
        let prompt = format!(
            "Conduct comprehensive market research on: {}\n\n\
             Focus on these specific aspects:\n\
             {}\n\
             Please:\n\
             1. Search for information from multiple sources\n\
             2. For each aspect, gather relevant data and insights\n\
             3. Include market size, trends, key players, and opportunities\n\
             4. Identify challenges and risks in the market\n\
             5. Cite all sources with URLs\n\n\
             Structure your findings by aspect and provide a summary of key insights.",
            topic, aspects_list
        );
        self.core
            .invoke(
                "conduct_market_research",
                format!("Researching {}", topic),
                prompt,
                json!({ "topic": topic, "aspects": aspects }),
            )
            .await
    }

    pub async fn analyze_competitors(
        &self,
        company: &str,
        competitors: &[String],
    ) -> Result<AgentResponse> {
        let prompt = format!(
            "Perform a competitive analysis for {} against these competitors: {}\n\n\
             For each company:\n\
             1. Gather information about their offerings\n\
             2. Analyze their strengths and weaknesses\n\
             3. Identify their market positioning\n\
             4. Find their unique value propositions\n\n\
             Provide a comparison matrix, key differentiators, and strategic \
             recommendations for {}. Cite all sources used.",
            company,
            competitors.join(", "),
            company
        );
        self.core
            .invoke(
                "analyze_competitors",
                format!("Analyzing competitors of {}", company),
                prompt,
                json!({ "company": company, "competitors": competitors }),
            )
            .await
    }

    pub async fn research_industry_trends(
        &self,
        industry: &str,
        time_horizon: &str,
    ) -> Result<AgentResponse> {
        let prompt = format!(
            "Research trends and future outlook for the {} industry over the {}.\n\n\
             Please investigate:\n\
             1. Current state of the industry\n\
             2. Emerging trends and technologies\n\
             3. Market drivers and growth factors\n\
             4. Potential disruptions or challenges\n\
             5. Expert predictions and forecasts\n\n\
             Provide a comprehensive trend analysis with supporting evidence and citations.",
            industry, time_horizon
        );
        self.core
            .invoke(
                "research_industry_trends",
                format!("Researching {} industry trends", industry),
                prompt,
                json!({ "industry": industry, "time_horizon": time_horizon }),
            )
            .await
    }

    pub async fn gather_customer_insights(
        &self,
        product_or_service: &str,
        aspects: &[String],
    ) -> Result<AgentResponse> {
        let aspects_list: String = aspects.iter().map(|a| format!("- {}\n", a)).collect();
        let prompt = format!(
            "Research customer insights and feedback for: {}\n\n\
             Analyze these aspects:\n\
             {}\n\
             Please:\n\
             1. Search for customer reviews and ratings\n\
             2. Find common complaints and praise\n\
             3. Identify customer pain points and desires\n\
             4. Analyze sentiment trends\n\
             5. Identify customer segments and their specific needs\n\n\
             Provide a summary of overall sentiment, key themes in customer \
             feedback, and actionable insights for improvement. Cite all sources.",
            product_or_service, aspects_list
        );
        self.core
            .invoke(
                "gather_customer_insights",
                format!("Gathering customer insights for {}", product_or_service),
                prompt,
                json!({ "product_or_service": product_or_service, "aspects": aspects }),
            )
            .await
    }

    pub async fn research_best_practices(
        &self,
        topic: &str,
        industry: Option<&str>,
    ) -> Result<AgentResponse> {
        let industry_phrase = match industry {
            Some(name) => format!(" in the {} industry", name),
            None => String::new(),
        };
        let prompt = format!(
            "Research best practices for {}{}.\n\n\
             Please:\n\
             1. Search for industry standards and guidelines\n\
             2. Find case studies and success stories\n\
             3. Identify common pitfalls to avoid\n\
             4. Find frameworks or methodologies\n\
             5. Compare different approaches\n\n\
             Provide clear best practice recommendations, examples of \
             successful implementations, and pros and cons of different \
             approaches. Focus on actionable, proven practices with \
             supporting evidence.",
            topic, industry_phrase
        );
        self.core
            .invoke(
                "research_best_practices",
                format!("Researching best practices for {}", topic),
                prompt,
                json!({ "topic": topic, "industry": industry }),
            )
            .await
    }

    pub async fn fact_check_claims(&self, claims: &[String]) -> Result<AgentResponse> {
        let claims_list: String = claims
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {}\n", i + 1, c))
            .collect();
        let prompt = format!(
            "Fact-check the following claims:\n\n\
             Claims to verify:\n\
             {}\n\
             For each claim:\n\
             1. Search for supporting evidence from reliable sources\n\
             2. Search for contradicting evidence\n\
             3. Determine if the claim is true, false, partially true, or unverifiable\n\
             4. Provide a confidence level in your assessment\n\
             5. Cite all sources used\n\n\
             Be thorough and objective in your fact-checking.",
            claims_list
        );
        self.core
            .invoke(
                "fact_check_claims",
                format!("Fact-checking {} claims", claims.len()),
                prompt,
                json!({ "claims": claims }),
            )
            .await
    }
}
