//! Cleanup of raw model text before it is handed to `serde_json`.
//!
//! Models asked for JSON still wrap it in markdown fences, prefix it with a
//! `<think>` block or add a sentence of chatter. These helpers peel that off
//! without trying to repair the JSON itself.

/// Removes a leading ```` ```json ```` / ```` ``` ```` fence and its closing fence.
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6) {
        return trimmed;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    // Drop the info string (`json`, `JSON`, ...) on the opening line.
    match inner.find('\n') {
        Some(newline) if !inner[..newline].trim().contains(|c: char| c == '{' || c == '[') => inner[newline + 1..].trim(),
        _ => inner.trim_start_matches("json").trim(),
    }
}

/// Drops a `<think>...</think>` preamble emitted by reasoning models.
pub fn strip_reasoning(content: &str) -> &str {
    match content.find("</think>") {
        Some(end) if content.trim_start().starts_with("<think>") => &content[end + "</think>".len()..],
        _ => content,
    }
}

/// Returns the outermost `{ ... }` span, or `None` when there is none.
pub fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Full cleanup pipeline: reasoning block, code fences, surrounding prose.
pub fn clean_json_payload(content: &str) -> Option<&str> {
    let without_reasoning = strip_reasoning(content);
    let unfenced = strip_code_fences(without_reasoning);
    extract_json_object(unfenced)
}
