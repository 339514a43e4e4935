//! Parsing of ReAct-formatted model output

use serde_json::Value;

/// One parsed step of the reasoning loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasoningStep {
    /// The model wants a tool run
    Action {
        thought: String,
        tool: String,
        /// Tool input, already unwrapped from the JSON kwargs
        input: String,
    },
    /// The model is done
    Answer { thought: String, answer: String },
}

/// Output that follows neither the action nor the answer format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError(pub String);

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Could not parse output: {}", self.0)
    }
}

const THOUGHT: &str = "Thought:";
const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";
const ANSWER: &str = "Answer:";
const OBSERVATION: &str = "Observation:";

/// Parse one model reply.
///
/// A reply with no `Thought:` marker at all is taken as a plain answer, so
/// models that skip the format still get their reply through.
pub fn parse_step(output: &str) -> Result<ReasoningStep, FormatError> {
    let output = output.trim();
    if !output.contains(THOUGHT) {
        return Ok(ReasoningStep::Answer {
            thought: "(Implicit) I can answer without any more tools!".to_string(),
            answer: output.to_string(),
        });
    }

    let action_at = output.find(ACTION);
    let answer_at = output.find(ANSWER);

    match (action_at, answer_at) {
        (Some(a), Some(b)) if a < b => parse_action(output, a),
        (Some(a), None) => parse_action(output, a),
        (_, Some(b)) => Ok(ReasoningStep::Answer {
            thought: thought_before(output, b),
            answer: output[b + ANSWER.len()..].trim().to_string(),
        }),
        (None, None) => Err(FormatError(
            "expected an `Action:` or an `Answer:` after the thought".to_string(),
        )),
    }
}

fn thought_before(output: &str, end: usize) -> String {
    let head = &output[..end];
    match head.find(THOUGHT) {
        Some(i) => head[i + THOUGHT.len()..].trim().to_string(),
        None => head.trim().to_string(),
    }
}

fn parse_action(output: &str, action_at: usize) -> Result<ReasoningStep, FormatError> {
    let after_action = &output[action_at + ACTION.len()..];
    let tool = after_action.lines().next().unwrap_or_default().trim().to_string();
    if tool.is_empty() {
        return Err(FormatError("`Action:` is missing a tool name".to_string()));
    }

    let Some(input_at) = after_action.find(ACTION_INPUT) else {
        return Err(FormatError(format!("`Action: {tool}` is missing `Action Input:`")));
    };
    let mut raw = &after_action[input_at + ACTION_INPUT.len()..];
    // models sometimes hallucinate the observation themselves
    if let Some(end) = raw.find(OBSERVATION) {
        raw = &raw[..end];
    }

    Ok(ReasoningStep::Action {
        thought: thought_before(output, action_at),
        tool,
        input: action_input(raw.trim()),
    })
}

/// Unwrap the tool input from the kwargs JSON the model was asked for.
///
/// `{"input": "..."}` yields the string; an object with a single string
/// value yields that value; anything that is not JSON is used verbatim.
pub(crate) fn action_input(raw: &str) -> String {
    let raw = strip_code_fence(raw);
    let json = serde_json::from_str::<Value>(raw).ok().or_else(|| {
        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        serde_json::from_str::<Value>(&raw[start..=end]).ok()
    });

    match json {
        Some(Value::Object(map)) => {
            if let Some(Value::String(s)) = map.get("input") {
                return s.clone();
            }
            let strings: Vec<&String> = map
                .values()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            let single = match strings.as_slice() {
                [only] => Some((*only).clone()),
                _ => None,
            };
            single.unwrap_or_else(|| Value::Object(map).to_string())
        }
        Some(Value::String(s)) => s,
        _ => raw.trim_matches('"').to_string(),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_step() {
        let output = "Thought: I need to look up the top scorer.\n\
                      Action: document_search\n\
                      Action Input: {\"input\": \"Premier League top scorer 2023\"}";

        assert_eq!(
            parse_step(output).unwrap(),
            ReasoningStep::Action {
                thought: "I need to look up the top scorer.".to_string(),
                tool: "document_search".to_string(),
                input: "Premier League top scorer 2023".to_string(),
            }
        );
    }

    #[test]
    fn test_answer_step() {
        let output = "Thought: I can answer without using any more tools.\n\
                      Answer: Erling Haaland scored 36 goals.";

        assert_eq!(
            parse_step(output).unwrap(),
            ReasoningStep::Answer {
                thought: "I can answer without using any more tools.".to_string(),
                answer: "Erling Haaland scored 36 goals.".to_string(),
            }
        );
    }

    #[test]
    fn test_no_thought_is_implicit_answer() {
        let step = parse_step("Arsenal finished second.").unwrap();
        assert!(matches!(
            step,
            ReasoningStep::Answer { answer, .. } if answer == "Arsenal finished second."
        ));
    }

    #[test]
    fn test_action_before_answer_wins() {
        let output = "Thought: search first\n\
                      Action: document_search\n\
                      Action Input: {\"input\": \"Ballon d'Or 2023\"}\n\
                      Observation: Messi\n\
                      Thought: done\n\
                      Answer: Messi";

        match parse_step(output).unwrap() {
            ReasoningStep::Action { input, .. } => assert_eq!(input, "Ballon d'Or 2023"),
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn test_thought_without_action_or_answer() {
        let err = parse_step("Thought: hmm, let me think").unwrap_err();
        assert!(err.to_string().starts_with("Could not parse output"));
    }

    #[test]
    fn test_missing_action_input() {
        let err = parse_step("Thought: x\nAction: document_search").unwrap_err();
        assert!(err.0.contains("Action Input"));
    }

    #[test]
    fn test_action_input_variants() {
        assert_eq!(action_input(r#"{"input": "Kane"}"#), "Kane");
        assert_eq!(action_input(r#"{"query": "Kane"}"#), "Kane");
        assert_eq!(action_input("```json\n{\"input\": \"Kane\"}\n```"), "Kane");
        assert_eq!(action_input(r#"the tool input is {"input": "Kane"} ok"#), "Kane");
        assert_eq!(action_input(r#""Kane""#), "Kane");
        assert_eq!(action_input("Harry Kane goals"), "Harry Kane goals");
        assert_eq!(action_input(r#"{"season": 2023}"#), r#"{"season":2023}"#);
    }
}
