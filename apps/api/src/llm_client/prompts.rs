// Shared prompt fragments.
// Each feature that needs LLM calls keeps its own prompts.rs alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every customer-facing prompt.
pub const NO_ADVICE_INSTRUCTION: &str = "\
    You are not a licensed financial adviser. Do not promise approval, quote \
    interest rates as offers, or state that an application will succeed. \
    When a question needs a human decision, say so and suggest contacting a broker.";
