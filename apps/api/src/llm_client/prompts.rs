// Cross-cutting prompt fragments. Callers with their own prompts keep them in a
// prompts.rs alongside the calling module.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to extraction prompts so the model leaves gaps rather than guessing.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only use information that appears in the provided text. \
    If a field is not mentioned, use null (or an empty list). \
    Never invent employers, dates, degrees or contact details.";
