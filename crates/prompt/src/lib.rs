//! # Prompt
//!
//! Prompt templates and formatting for the health assistant.
//!
//! ## Format
//!
//! The system prompt is assembled in this order:
//!
//! - **Instructions**: [`SYSTEM_PROMPT`] with `{user_info}` and `{time}` filled
//! - **Health data** (optional): [`SECTION_HEALTH`] + the user's mock health summary
//! - **Memories** (optional): [`SECTION_MEMORIES`] + one `- fact (context)` line per memory,
//!   closed by the continuity instruction ([`CONTINUITY_INSTRUCTION`])
//!
//! Conversation history is sent as alternating user/assistant messages followed by the new
//! user message (see [`format_for_model_as_messages`]).
//!
//! ## External interactions
//!
//! - **AI models**: output is sent to the Anthropic Messages API.

/// Role of a message in a chat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// System instruction (sent as the request `system` field by Anthropic clients).
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Assistant instructions. Placeholders: `{user_info}`, `{time}`.
pub const SYSTEM_PROMPT: &str = "You are Fitbit's AI Health Assistant, designed to help users make healthier lifestyle choices through personalized, data-driven insights.

Your role is to:
1. Analyze the user's health data (steps, heart rate, sleep, goals)
2. Provide personalized, actionable health insights
3. Ask follow-up questions to understand user needs better
4. Offer helpful suggestions and nudges
5. Build trust through ongoing dialogue

Current user context:
{user_info}

System Time: {time}

Remember to:
- Be encouraging and supportive
- Provide specific, actionable advice based on their health data
- Ask clarifying questions when needed
- Reference the user's actual data when available
- Suggest realistic next steps
- Maintain a conversational, friendly tone";

/// Section title for the health data summary.
pub const SECTION_HEALTH: &str = "**CURRENT HEALTH DATA:**";

/// Section title for stored memories.
pub const SECTION_MEMORIES: &str = "**IMPORTANT - USER MEMORIES & PREVIOUS CONTEXT:**";

pub const MEMORIES_INTRO: &str = "You have stored the following information about this user. Use this context to provide personalized, continuous responses:";

pub const CONTINUITY_INSTRUCTION: &str = "**CRITICAL:** Based on these memories, DO NOT greet the user as if meeting for the first time. Continue the conversation naturally based on previous interactions and their established goals.";

/// Time format used for `{time}`.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reply returned when the model cannot be reached.
pub const FALLBACK_REPLY: &str = "I'm having trouble reaching my health insights right now. Your data is safe, and I remember what you've shared with me. Please try again in a moment.";

/// Instructions for the memory evaluation call. The model must answer with JSON only.
pub const MEMORY_EVALUATION_PROMPT: &str = r#"You decide whether the user's latest message contains information worth remembering long term for a health assistant.

Answer with a single JSON object and nothing else:
{"evaluation": "STORE" | "SKIP" | "EXPLICIT", "content": "<the fact, third person, one sentence>", "context": "<short note on where it came from>"}

Use:
- "EXPLICIT" when the user directly asks you to remember something.
- "STORE" for durable facts: injuries, medical conditions, goals, preferences, routines, constraints, equipment, schedule.
- "SKIP" for greetings, questions about their data, small talk, or anything temporary.

When the evaluation is "SKIP", "content" and "context" may be empty strings."#;

/// Fills `{user_info}` and `{time}` in `template`.
pub fn render_system_prompt(template: &str, user_id: &str, time: &str) -> String {
    template
        .replace("{user_info}", &format!("User ID: {}", user_id))
        .replace("{time}", time)
}

/// Memory block appended to the system prompt, or `None` when there are no lines.
pub fn format_memory_block<I, S>(memory_lines: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<String> = memory_lines
        .into_iter()
        .map(|l| l.as_ref().trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }
    let mut out = String::new();
    out.push_str(SECTION_MEMORIES);
    out.push('\n');
    out.push_str(MEMORIES_INTRO);
    out.push('\n');
    out.push_str(&lines.join("\n"));
    out.push_str("\n\n");
    out.push_str(CONTINUITY_INSTRUCTION);
    Some(out)
}

/// Full system prompt: rendered instructions, optional health section, optional memory block.
pub fn compose_system_prompt<I, S>(
    rendered_instructions: &str,
    health_summary: Option<&str>,
    memory_lines: I,
) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = rendered_instructions.trim_end().to_string();
    if let Some(summary) = health_summary.filter(|s| !s.trim().is_empty()) {
        out.push_str("\n\n");
        out.push_str(SECTION_HEALTH);
        out.push('\n');
        out.push_str(summary.trim_end());
    }
    if let Some(block) = format_memory_block(memory_lines) {
        out.push_str("\n\n");
        out.push_str(&block);
    }
    out
}

/// Builds the request messages: optional system, then each `(user, assistant)` turn in order,
/// then the current question as the last user message.
pub fn format_for_model_as_messages<H, U, A>(
    system_message: Option<&str>,
    history: H,
    current_question: &str,
) -> Vec<ChatMessage>
where
    H: IntoIterator<Item = (U, A)>,
    U: AsRef<str>,
    A: AsRef<str>,
{
    let mut messages = Vec::new();
    if let Some(system) = system_message {
        messages.push(ChatMessage::system(system));
    }
    for (user, assistant) in history {
        messages.push(ChatMessage::user(user.as_ref()));
        messages.push(ChatMessage::assistant(assistant.as_ref()));
    }
    messages.push(ChatMessage::user(current_question));
    messages
}

/// Transcript handed to the memory evaluation call: the previous turn, if any, for context,
/// followed by the message being evaluated.
pub fn format_evaluation_transcript(previous: Option<(&str, &str)>, message: &str) -> String {
    let mut out = String::new();
    if let Some((user, assistant)) = previous {
        out.push_str("Previous user message: ");
        out.push_str(user);
        out.push('\n');
        out.push_str("Previous assistant reply: ");
        out.push_str(assistant);
        out.push_str("\n\n");
    }
    out.push_str("Latest user message: ");
    out.push_str(message);
    out
}
