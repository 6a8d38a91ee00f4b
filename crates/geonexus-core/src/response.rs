use serde_json::Value;

/// Answer fields the backend may use, in priority order.
/// `llm_response` carries the generated answer, `answer` is the generic fallback.
pub const ANSWER_FIELDS: [&str; 3] = ["llm_response", "generated_answer", "answer"];

/// Shown by callers that only want the extracted answer when none is present
pub const NO_ANSWER: &str = "No answer found.";

/// How an assistant payload should be displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    /// The payload was a JSON object with a non-empty answer field
    RecognizedAnswer(String),
    /// Anything else, shown verbatim
    RawPayload(String),
}

impl ParsedResponse {
    pub fn is_recognized(&self) -> bool {
        matches!(self, ParsedResponse::RecognizedAnswer(_))
    }

    /// The answer when one was recognized, otherwise the raw payload
    pub fn display_text(&self) -> &str {
        match self {
            ParsedResponse::RecognizedAnswer(answer) => answer,
            ParsedResponse::RawPayload(raw) => raw,
        }
    }

    /// The answer when one was recognized, otherwise [`NO_ANSWER`]
    pub fn answer_or_default(&self) -> &str {
        match self {
            ParsedResponse::RecognizedAnswer(answer) => answer,
            ParsedResponse::RawPayload(_) => NO_ANSWER,
        }
    }
}

/// Interpret a stored assistant payload. Never fails: anything that isn't a
/// JSON object carrying a recognized answer falls back to [`ParsedResponse::RawPayload`].
pub fn parse_response(payload: &str) -> ParsedResponse {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => match extract_answer(&value) {
            Some(answer) => ParsedResponse::RecognizedAnswer(answer.to_string()),
            None => ParsedResponse::RawPayload(payload.to_string()),
        },
        Err(_) => ParsedResponse::RawPayload(payload.to_string()),
    }
}

/// First non-empty string answer field of a JSON object
pub fn extract_answer(value: &Value) -> Option<&str> {
    let object = value.as_object()?;
    ANSWER_FIELDS.iter().find_map(|field| {
        object
            .get(*field)
            .and_then(Value::as_str)
            .filter(|answer| !answer.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_field_is_recognized() {
        let parsed = parse_response(r#"{"answer": "Satellite X is active."}"#);
        assert_eq!(
            parsed,
            ParsedResponse::RecognizedAnswer("Satellite X is active.".to_string())
        );
    }

    #[test]
    fn test_llm_response_wins_over_answer() {
        let parsed = parse_response(r#"{"answer": "generic", "llm_response": "generated"}"#);
        assert_eq!(parsed.display_text(), "generated");
    }

    #[test]
    fn test_empty_generated_answer_falls_through_to_answer() {
        let parsed = parse_response(r#"{"llm_response": "", "answer": "fallback"}"#);
        assert_eq!(parsed.display_text(), "fallback");
    }

    #[test]
    fn test_object_without_answer_is_raw() {
        let payload = r#"{"status":"error","message":"Query is missing."}"#;
        let parsed = parse_response(payload);
        assert_eq!(parsed, ParsedResponse::RawPayload(payload.to_string()));
        assert_eq!(parsed.answer_or_default(), NO_ANSWER);
    }

    #[test]
    fn test_non_string_answer_is_raw() {
        let payload = r#"{"answer": 42}"#;
        assert!(!parse_response(payload).is_recognized());
    }

    #[test]
    fn test_json_that_is_not_an_object_is_raw() {
        assert!(!parse_response(r#""just a string""#).is_recognized());
        assert!(!parse_response("[1, 2, 3]").is_recognized());
    }

    #[test]
    fn test_plain_text_is_raw() {
        let text = "Sorry, I encountered an error.";
        assert_eq!(parse_response(text).display_text(), text);
    }
}
