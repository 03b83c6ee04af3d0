//! Prompt construction for the accessibility judge.

use serde_json::json;

use crate::error::Error;
use crate::reconcile::SCHEMA_VERSION;
use crate::types::ParsedMarkdownStructure;

/// Standing instructions sent as the system message.
pub const SYSTEM_PROMPT: &str = "You are an accessibility expert for educational content. \
Review Markdown content contextually and pragmatically, not as a blind checklist. \
Prioritize custom rules when they conflict with general best practices. \
Output STRICT JSON only, with no markdown fences or extra text.";

/// Appended to the user prompt when the first reply was not JSON.
pub const RETRY_SUFFIX: &str = "\n\nYour previous response was not valid JSON. \
Return only valid JSON matching the required schema.";

/// Marker appended to text cut at a size limit.
const TRUNCATION_MARKER: &str = "\n\n[TRUNCATED FOR TOKEN LIMIT]";

/// Character limits applied to prompt inputs.
#[derive(Debug, Clone, Copy)]
pub struct PromptLimits {
    /// Most characters of the document included.
    pub max_document_chars: usize,
    /// Most characters of the custom rules included.
    pub max_rules_chars: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        return Self { max_document_chars: 12_000, max_rules_chars: 4_000 };
    }
}

/// Cut `text` to `max_chars` characters, marking the cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str(TRUNCATION_MARKER);
    return cut;
}

/// Build the user message: task, rules, extracted structure, document, schema.
///
/// # Errors
///
/// Returns `Error::Json` if the structure cannot be serialized.
pub fn build_user_prompt(
    markdown_text: &str,
    rules_text: Option<&str>,
    structure: &ParsedMarkdownStructure,
    limits: PromptLimits,
) -> Result<String, Error> {
    let rules = rules_text
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("No custom rules provided.");

    let structure_json = serde_json::to_string_pretty(structure)?;
    let schema_json = serde_json::to_string_pretty(&output_schema())?;

    return Ok(format!(
        "Review this Markdown document for accessibility issues. \
Use context-aware judgment. Missing alt text is only an issue when context suggests an informative image, \
and may be acceptable if decorative and explicitly indicated or already fully described nearby.\n\n\
Tasks:\n\
1) Identify accessibility issues with severity\n\
2) Explain impact for assistive technologies and cognitive accessibility\n\
3) Suggest concrete improvements (include example alt text when relevant)\n\
4) Provide score from 0-100 with transparent penalty breakdown\n\n\
Custom Rules (prioritize if conflicts):\n{}\n\n\
Extracted Markdown Structure:\n{structure_json}\n\n\
Markdown Content:\n{}\n\n\
Return JSON EXACTLY with this shape:\n{schema_json}\n\
No extra keys. No markdown code fences.",
        truncate_text(rules, limits.max_rules_chars),
        truncate_text(markdown_text, limits.max_document_chars),
    ));
}

/// Shape of the reply the judge must produce.
fn output_schema() -> serde_json::Value {
    return json!({
        "schema_version": SCHEMA_VERSION,
        "score": "integer 0-100",
        "score_breakdown": {
            "base": 100,
            "penalties": [
                {"severity": "high|medium|low", "count": "int", "penalty_per_item": "int", "subtotal": "int"}
            ],
            "final": "int"
        },
        "summary_bullets": ["3-6 concise bullets"],
        "issues": [
            {
                "id": "ISSUE-1",
                "severity": "low|medium|high",
                "title": "short",
                "explanation": "1-3 educator-friendly sentences",
                "evidence": "snippet or reference",
                "suggestion": "specific actionable fix"
            }
        ],
        "applied_rules": "optional string"
    });
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;
    use crate::markdown;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_text("héllo", 5), "héllo");
    }

    #[test]
    fn long_text_is_cut_by_characters() {
        let cut = truncate_text("ééééé", 2);
        assert_eq!(cut, format!("éé{TRUNCATION_MARKER}"));
    }

    #[test]
    fn prompt_carries_rules_structure_and_schema_version() {
        let doc = "# Title\n![](a.png)\n";
        let structure = markdown::extract(doc);
        let prompt =
            build_user_prompt(doc, Some("  Alt text under 100 chars.  "), &structure, PromptLimits::default())
                .unwrap();
        assert!(prompt.contains("Alt text under 100 chars."));
        assert!(prompt.contains("\"url\": \"a.png\""));
        assert!(prompt.contains("\"schema_version\": 1"));
        assert!(prompt.contains(doc));
    }

    #[test]
    fn missing_rules_are_stated() {
        let prompt =
            build_user_prompt("text", None, &ParsedMarkdownStructure::default(), PromptLimits::default()).unwrap();
        assert!(prompt.contains("No custom rules provided."));
    }
}
