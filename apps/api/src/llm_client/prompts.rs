// Cross-cutting prompt fragments shared by every LLM-backed feature.

/// Appended to every system prompt that expects structured output.
pub const JSON_ONLY_RULES: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
