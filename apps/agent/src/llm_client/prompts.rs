// Shared prompt constants. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file contains cross-cutting fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Corrective prompt sent after a reply that failed JSON-list parsing.
/// Replace `{raw}` before sending.
pub const REFORMAT_PROMPT_TEMPLATE: &str = r#"Your previous reply could not be parsed as a JSON array of strings.

PREVIOUS REPLY:
{raw}

Reformat the same content as a valid JSON array of strings, for example:
["first item", "second item"]

Return ONLY the JSON array."#;
