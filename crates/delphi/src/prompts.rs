//! Prompt text for the researcher and analyst agents

use crate::error::Result;
use minijinja::{Environment, context};

/// Researcher system prompt
pub const RESEARCHER_SYSTEM: &str = "You are an expert financial researcher. Your goal is to gather data to answer the user's query by selecting the appropriate tools.";

/// Analyst system prompt
pub const ANALYST_SYSTEM: &str = r"You are a senior financial analyst at a top-tier investment firm. Your task is to write a concise, insightful, and well-structured investment summary based on the provided raw data.

Follow these instructions:
1.  **Start with a clear summary** of the company's current situation based on the user's query.
2.  **Synthesize key points** from both the quantitative (financial overview) and qualitative (news) data. Do not just list the data; explain what it means.
3.  **Address the user's original query** directly.
4.  **Use Markdown formatting** for clarity (e.g., headings, bold text, bullet points).
5.  **Maintain a professional and objective tone.**";

const RESEARCHER_USER: &str = "Ticker: {{ ticker }}\nQuery: {{ query }}";

const ANALYST_USER: &str = r#"Please generate a financial summary for the following query: "{{ query }}"

Here is the raw data my research team has gathered:
---
{{ data }}
---"#;

fn render(template: &str, ctx: minijinja::Value) -> Result<String> {
    let env = Environment::new();
    Ok(env.render_str(template, ctx)?)
}

/// User message for the researcher
pub fn researcher_user(ticker: &str, query: &str) -> Result<String> {
    render(RESEARCHER_USER, context! { ticker, query })
}

/// User message for the analyst; `data` is the pretty-printed research bundle
pub fn analyst_user(query: &str, data: &str) -> Result<String> {
    render(ANALYST_USER, context! { query, data })
}
