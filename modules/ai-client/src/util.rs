/// Strip a markdown code fence when the entire response is wrapped in one.
/// Handles both the generic and the JSON-tagged fence; anything else is
/// returned trimmed but untouched.
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    for opener in ["```json", "```"] {
        if let Some(inner) = trimmed
            .strip_prefix(opener)
            .and_then(|rest| rest.strip_suffix("```"))
        {
            return inner.trim();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_tagged_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn strips_generic_fence() {
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn partial_fence_is_not_stripped() {
        // Fence must wrap the whole response to be removed.
        assert_eq!(strip_code_fence("```json\n{}"), "```json\n{}");
    }
}
