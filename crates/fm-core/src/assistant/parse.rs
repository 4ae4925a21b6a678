use once_cell::sync::Lazy;
use regex::Regex;

use crate::matching::RequirementHint;
use crate::{ConversationMessage, MessageRole};

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").unwrap());
static FENCED_ANY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```\s*(\{.*?\})\s*```").unwrap());
static BARE_BRACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Pull the JSON object out of a model reply. Models wrap the payload
/// inconsistently, so try a fenced ```json block first, then any fenced
/// block, then the widest bare brace span.
pub fn extract_json_block(reply: &str) -> Option<&str> {
    if let Some(caps) = FENCED_JSON.captures(reply) {
        return caps.get(1).map(|m| m.as_str());
    }
    if let Some(caps) = FENCED_ANY.captures(reply) {
        return caps.get(1).map(|m| m.as_str());
    }
    BARE_BRACES.find(reply).map(|m| m.as_str())
}

/// Parse a structured requirement hint out of a model reply. `None`
/// covers both "no JSON present" and "JSON did not fit the shape".
pub fn parse_requirement_hint(reply: &str) -> Option<RequirementHint> {
    let block = extract_json_block(reply)?;
    serde_json::from_str(block).ok()
}

fn transcript(history: &[ConversationMessage]) -> String {
    history
        .iter()
        .map(|msg| {
            let speaker = match msg.role {
                MessageRole::User => "Buyer",
                MessageRole::Bot => "AI",
            };
            format!("{speaker}: {}", msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt asking the model to distill the conversation into the
/// structured requirement JSON. The format block mirrors the hint
/// deserializer exactly.
pub fn extraction_prompt(history: &[ConversationMessage]) -> String {
    format!(
        "Analyze this conversation between a buyer and an AI assistant about finding \
freelancers. Extract ALL relevant keywords, skills, services, and requirements \
mentioned by the buyer.\n\n\
Return ONLY a valid JSON object in this exact format (no markdown, no explanation):\n\n\
{{\n\
  \"skills\": [\"skill1\", \"skill2\"],\n\
  \"keywords\": [\"keyword1\", \"keyword2\", \"keyword3\"],\n\
  \"primaryService\": \"the single main service requested, or null\",\n\
  \"serviceCategory\": \"broad category such as web development or graphic design, or null\",\n\
  \"budget\": {{\"min\": 0, \"max\": 0}},\n\
  \"timeline\": \"flexible\"\n\
}}\n\n\
Rules:\n\
- skills: technical skills, technologies, services, or tools mentioned\n\
- keywords: ALL important terms from the conversation, including variations\n\
- budget: min and max in USD (use 0 if not mentioned)\n\
- timeline: \"urgent\", \"1 week\", \"2 weeks\", \"1 month\", or \"flexible\"\n\n\
Conversation:\n{}\n\n\
Return ONLY the JSON object:",
        transcript(history)
    )
}

const REPLY_SYSTEM_PROMPT: &str = "You are a helpful AI assistant for a freelance \
marketplace, connecting buyers with freelancers. Your role is to:\n\
1. Have a friendly conversation with buyers\n\
2. Understand what they're looking for (skills, budget, timeline, project details)\n\
3. Ask clarifying questions if needed\n\
4. Once you have enough information, acknowledge that you'll find matching freelancers\n\n\
Keep responses conversational, helpful, and concise (2-3 sentences max).";

/// Prompt for the conversational reply. Only the last few turns are
/// included so the prompt stays bounded.
pub fn reply_prompt(history: &[ConversationMessage], message: &str) -> String {
    let recent: Vec<ConversationMessage> = history
        .iter()
        .rev()
        .take(10)
        .rev()
        .cloned()
        .collect();

    format!(
        "{REPLY_SYSTEM_PROMPT}\n\nConversation so far:\n{}\n\nBuyer: {message}\nAI:",
        transcript(&recent)
    )
}
