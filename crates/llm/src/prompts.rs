//! Prompt templates and system-instruction composition

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::types::{CustomPrompt, SummarizationOptions, DEFAULT_FORMAT};

/// Opening line of every system instruction
pub const SYSTEM_PREAMBLE: &str = "You are an expert at summarizing documents.";

/// Always appended to the system instruction
pub const MARKDOWN_GUIDANCE: &str = "Use markdown formatting for better readability, including headers, lists, and emphasis where appropriate.";

/// Appended to the system instruction of the reconciliation call
pub const FINAL_SUMMARY_DIRECTIVE: &str = "Provide a final coherent summary.";

/// Labeled choice shown next to a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Named instruction blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: String,
    pub name: String,
    pub description: String,

    /// Instruction text, may contain `{{variable}}` placeholders
    pub template: String,

    pub customizable: bool,

    /// Built-in (immutable) vs user-authored
    pub is_system_template: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PromptOption>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_options: Vec<PromptOption>,
}

fn system_template(id: &str, name: &str, description: &str, template: &str) -> PromptTemplate {
    PromptTemplate {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        template: template.to_string(),
        customizable: true,
        is_system_template: true,
        created_at: None,
        updated_at: None,
        category: None,
        options: Vec::new(),
        default_options: Vec::new(),
    }
}

/// Built-in templates, in display order
pub fn system_templates() -> Vec<PromptTemplate> {
    vec![
        system_template(
            "paragraph",
            "Paragraph",
            "A concise prose summary suitable for any document.",
            "Summarize the document in clear, well-structured paragraphs. Capture the main ideas, key arguments, and conclusions, and leave out minor details and repetition.",
        ),
        system_template(
            "bullet_points",
            "Bullet Points",
            "A scannable list of the document's key points.",
            "Summarize the document as a list of bullet points. Group related points under short headings, keep each bullet to one idea, and order them by importance.",
        ),
        system_template(
            "financial",
            "Financial Report",
            "A comprehensive summary format for financial reports and analysis.",
            r#"Analyze the financial reports provided by brokerage and investment research firms. Generate a concise, investor-focused summary that offers a high-level assessment of the investment opportunity, so investors can quickly decide whether to read the full report. Include the following sections:
1. Key Takeaways & Market Outlook
* Main Insights: the core messages of the report.
* Market Sentiment: whether the overall tone is bullish, bearish, or neutral.
* Macroeconomic Impact: significant economic or industry-wide factors affecting the outlook.
2. Investment Opportunity & Stock Rating
* Analyst Ratings: the brokerage's rating (e.g., Buy, Hold, Sell, Overweight, Underweight).
* Price Targets: the price target compared to the current market price.
* Bullish/Bearish Arguments: the key reasons supporting the rating.
3. Financial & Valuation Highlights
* Financial Metrics: revenue growth, earnings forecasts, profit margins, debt levels, and cash flow trends.
* Valuation Measures: P/E, EV/EBITDA, DCF assessments, and peer comparisons.
* Recent Updates: revisions in estimates, dividend changes, or earnings surprises.
4. Risk Factors & Challenges
* Primary Risks: regulatory, competitive, or economic risks mentioned in the report.
* Threat Analysis: external factors that could adversely impact the company or sector.
5. Analyst Insights & Future Catalysts
* Key Catalysts: upcoming events such as earnings releases, product launches, or regulatory decisions.
* Industry Trends: broader trends that might affect future performance.
6. Actionable Investment Summary
* Opportunity Assessment: a clear judgment on whether the investment appears attractive.
* Entry/Exit Strategies: potential entry or exit points and risk management strategies if applicable.
* Next Steps: a brief directive encouraging investors to review the full report.
Keep the summary clear, data-driven, and unbiased, emphasising the factors that matter for an investment decision."#,
        ),
        system_template(
            "academic",
            "Academic Paper",
            "A summary format suitable for academic papers and research articles.",
            r#"Analyze the academic content and provide a summary with these sections:
1. Research Overview
* Research Question/Hypothesis
* Methodology
* Key Findings

2. Literature Review
* Theoretical Framework
* Previous Research
* Knowledge Gaps

3. Methodology Analysis
* Research Design
* Data Collection
* Analysis Methods

4. Results & Discussion
* Key Findings
* Statistical Significance
* Implications

5. Conclusions
* Research Contribution
* Limitations
* Future Research Directions"#,
        ),
        system_template(
            "technical",
            "Technical Documentation",
            "A summary format for technical documents and specifications.",
            r#"Analyze the technical content and provide a summary with these sections:
1. Technical Overview
* System Architecture
* Key Components
* Technologies Used

2. Implementation Details
* Core Features
* Technical Requirements
* Dependencies

3. Performance & Security
* Performance Metrics
* Security Measures
* Scalability Considerations

4. Integration & Deployment
* Integration Points
* Deployment Process
* Configuration Requirements

5. Maintenance & Support
* Monitoring
* Troubleshooting
* Updates & Patches"#,
        ),
    ]
}

/// Substitute `{{key}}` placeholders; unknown placeholders are left as-is
pub fn render_template(template: &str, variables: &BTreeMap<String, String>) -> String {
    variables
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{{{}}}}}", key), value)
        })
}

/// System templates merged with user templates
///
/// System entries are consulted first, so a user template never shadows a
/// built-in key.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    system: Vec<PromptTemplate>,
    user: Vec<PromptTemplate>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TemplateRegistry {
    /// Create registry from user templates
    pub fn new(user: Vec<PromptTemplate>) -> Self {
        Self {
            system: system_templates(),
            user,
        }
    }

    /// Look up a template by key
    pub fn get(&self, key: &str) -> Option<&PromptTemplate> {
        self.system
            .iter()
            .find(|t| t.id == key)
            .or_else(|| self.user.iter().find(|t| t.id == key))
    }

    /// Whether the key belongs to a built-in template
    pub fn is_system_key(&self, key: &str) -> bool {
        self.system.iter().any(|t| t.id == key)
    }

    /// All reachable templates, system first
    pub fn templates(&self) -> impl Iterator<Item = &PromptTemplate> {
        self.system.iter().chain(
            self.user
                .iter()
                .filter(move |t| !self.is_system_key(&t.id)),
        )
    }
}

/// Builds the system instruction that steers a summarization run
#[derive(Debug, Clone, Default)]
pub struct PromptComposer {
    registry: TemplateRegistry,
}

impl PromptComposer {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Format-specific instruction body
    ///
    /// A custom template replaces the named format unless it is blank.
    pub fn format_instruction(&self, format: &str, custom: Option<&CustomPrompt>) -> String {
        if let Some(custom) = custom.filter(|c| !c.template.trim().is_empty()) {
            return render_template(&custom.template, &custom.variables);
        }

        match self.registry.get(format) {
            Some(template) => template.template.clone(),
            None => {
                warn!(
                    "Template '{}' not found, falling back to {} format",
                    format, DEFAULT_FORMAT
                );
                self.registry
                    .get(DEFAULT_FORMAT)
                    .map(|t| t.template.clone())
                    .unwrap_or_default()
            }
        }
    }

    /// Full system instruction for a run
    pub fn compose(&self, options: &SummarizationOptions) -> String {
        let format_instruction =
            self.format_instruction(&options.format, options.custom_prompt.as_ref());
        let language_instruction = options
            .language
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .map(|l| format!("Provide the summary in {}.", l.trim()));
        let length_instruction = options
            .max_length
            .map(|n| format!("Keep the summary under {} words.", n));

        [
            Some(SYSTEM_PREAMBLE.to_string()),
            Some(format_instruction).filter(|s| !s.trim().is_empty()),
            language_instruction,
            length_instruction,
            Some(MARKDOWN_GUIDANCE.to_string()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// System instruction for the reconciliation call
    pub fn compose_final(&self, options: &SummarizationOptions) -> String {
        with_final_directive(&self.compose(options))
    }
}

/// Append the reconciliation directive to a composed instruction
pub fn with_final_directive(system_prompt: &str) -> String {
    format!("{} {}", system_prompt, FINAL_SUMMARY_DIRECTIVE)
}

/// User message for the first chunk
pub fn first_chunk_message(chunk: &str) -> String {
    format!("Summarize the following text:\n\n{}", chunk)
}

/// User message for every later chunk
pub fn continuation_message(chunk: &str) -> String {
    format!("Continue summarizing with this additional context:\n\n{}", chunk)
}

/// Prior-context turn carrying the running summary
pub fn running_summary_message(summary: &str) -> String {
    format!("Previous summary so far:\n{}", summary)
}

/// User message of the reconciliation call
pub fn reconciliation_message(running_summary: &str, final_part: &str) -> String {
    format!(
        "Based on all the previous summaries and this final part, provide a coherent final summary:\n\nPrevious summaries:\n{}\n\nFinal part summary:\n{}",
        running_summary, final_part
    )
}
