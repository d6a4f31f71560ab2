use crate::domain::contract::LlmClassification;
use anyhow::Context;

/// Body of a ```` ``` ```` / ```` ```json ```` block, or the whole text when unfenced.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    let body = match body.rfind("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

/// The classification array out of a chat reply: a fenced block is taken as
/// is, otherwise the span from the first `[` to the last `]`.
pub fn extract_json_array(text: &str) -> Option<String> {
    let body = strip_code_fence(text);
    if text.trim_start().starts_with("```") {
        return Some(body.to_string());
    }
    match (body.find('['), body.rfind(']')) {
        (Some(open), Some(close)) if open < close => Some(body[open..=close].to_string()),
        _ => None,
    }
}

pub fn parse_classifications(text: &str) -> anyhow::Result<Vec<LlmClassification>> {
    let json_str = extract_json_array(text).unwrap_or_else(|| text.trim().to_string());
    serde_json::from_str::<Vec<LlmClassification>>(&json_str)
        .with_context(|| format!("LLM output is not a valid classification array: {json_str}"))
}

/// Cuts a truncated array back to its last complete record and closes it.
///
/// Works on the fence-stripped reply rather than the `[`..`]` span, since a
/// `]` inside a reason string would otherwise hide the records after it.
pub fn repair_truncated_array(text: &str) -> Option<String> {
    let body = strip_code_fence(text);
    let open = body.find('[')?;
    let last_record_end = body.rfind('}')?;
    (last_record_end > open).then(|| format!("{}]", &body[open..=last_record_end]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    Strict,
    Repaired,
}

/// Strict parse first, then a single truncate-and-close repair attempt.
pub fn parse_with_repair(text: &str) -> anyhow::Result<(Vec<LlmClassification>, ParseTier)> {
    let strict_err = match parse_classifications(text) {
        Ok(items) => return Ok((items, ParseTier::Strict)),
        Err(err) => err,
    };

    let repaired = repair_truncated_array(text)
        .with_context(|| format!("no complete record to salvage ({strict_err})"))?;
    let items = serde_json::from_str::<Vec<LlmClassification>>(&repaired)
        .with_context(|| format!("repaired output still invalid: {repaired}"))?;
    Ok((items, ParseTier::Repaired))
}
