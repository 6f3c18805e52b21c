//! Memory evaluation: decide whether the latest message holds a fact worth keeping.
//!
//! The model answers with a JSON verdict; when the call or the parse fails a keyword
//! heuristic decides instead.

use std::fmt;

use llm_client::LlmClient;
use memory_core::MemoryKind;
use prompt::{format_evaluation_transcript, ChatMessage, MEMORY_EVALUATION_PROMPT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Store,
    Skip,
    Explicit,
}

impl Verdict {
    /// Unknown or missing values are `Skip`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "STORE" => Verdict::Store,
            "EXPLICIT" => Verdict::Explicit,
            _ => Verdict::Skip,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Store => "STORE",
            Verdict::Skip => "SKIP",
            Verdict::Explicit => "EXPLICIT",
        }
    }

    pub fn should_store(&self) -> bool {
        !matches!(self, Verdict::Skip)
    }

    /// Memory kind for a stored verdict.
    pub fn memory_kind(&self) -> MemoryKind {
        match self {
            Verdict::Explicit => MemoryKind::Explicit,
            _ => MemoryKind::Inferred,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
    Model,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryEvaluation {
    pub verdict: Verdict,
    pub content: String,
    pub context: String,
    pub source: EvaluationSource,
}

impl MemoryEvaluation {
    fn skip(source: EvaluationSource) -> Self {
        Self {
            verdict: Verdict::Skip,
            content: String::new(),
            context: String::new(),
            source,
        }
    }
}

#[derive(Deserialize)]
struct RawEvaluation {
    evaluation: Option<String>,
    content: Option<String>,
    context: Option<String>,
}

const EXPLICIT_CUES: &[&str] = &[
    "remember",
    "don't forget",
    "do not forget",
    "keep in mind",
    "make a note",
];

const FACT_CUES: &[&str] = &[
    "i have",
    "i've got",
    "my goal",
    "injury",
    "injured",
    "i'm allergic",
    "i am allergic",
    "allergic to",
    "i prefer",
    "diagnosed",
    "i'm training for",
    "i am training for",
];

/// Parses the model's verdict. Tolerates prose or code fences around the JSON object.
///
/// Returns `None` when no JSON object can be read. A stored verdict with empty content
/// falls back to the message itself.
pub fn parse_evaluation(raw: &str, message: &str) -> Option<MemoryEvaluation> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    let parsed: RawEvaluation = serde_json::from_str(&raw[start..=end]).ok()?;
    let verdict = parsed
        .evaluation
        .as_deref()
        .map(Verdict::parse)
        .unwrap_or(Verdict::Skip);
    if !verdict.should_store() {
        return Some(MemoryEvaluation::skip(EvaluationSource::Model));
    }

    let content = parsed
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| message.trim().to_string());
    let context = parsed
        .context
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default_context(verdict).to_string());

    Some(MemoryEvaluation {
        verdict,
        content,
        context,
        source: EvaluationSource::Model,
    })
}

fn default_context(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Explicit => "User asked to remember this",
        _ => "Shared in conversation",
    }
}

/// Keyword fallback used when the model cannot be asked or answers garbage.
///
/// Questions are never stored. For statements, explicit cues win over fact cues.
pub fn heuristic_evaluation(message: &str) -> MemoryEvaluation {
    let trimmed = message.trim();
    if trimmed.ends_with('?') {
        return MemoryEvaluation::skip(EvaluationSource::Heuristic);
    }
    let lowered = trimmed.to_lowercase();

    let verdict = if EXPLICIT_CUES.iter().any(|cue| lowered.contains(cue)) {
        Verdict::Explicit
    } else if FACT_CUES.iter().any(|cue| lowered.contains(cue)) {
        Verdict::Store
    } else {
        return MemoryEvaluation::skip(EvaluationSource::Heuristic);
    };

    MemoryEvaluation {
        verdict,
        content: trimmed.to_string(),
        context: default_context(verdict).to_string(),
        source: EvaluationSource::Heuristic,
    }
}

/// Asks the model for a verdict, falling back to [`heuristic_evaluation`].
pub async fn evaluate_message(
    llm: &dyn LlmClient,
    previous_turn: Option<(&str, &str)>,
    message: &str,
) -> MemoryEvaluation {
    let messages = vec![
        ChatMessage::system(MEMORY_EVALUATION_PROMPT),
        ChatMessage::user(format_evaluation_transcript(previous_turn, message)),
    ];

    match llm.get_llm_response_with_messages(messages).await {
        Ok(raw) => match parse_evaluation(&raw, message) {
            Some(evaluation) => {
                debug!(verdict = %evaluation.verdict, "Model memory evaluation parsed");
                evaluation
            }
            None => {
                warn!(response = %truncate(&raw, 200), "Unparseable memory evaluation, using heuristic");
                heuristic_evaluation(message)
            }
        },
        Err(e) => {
            info!(error = %e, "Memory evaluation call failed, using heuristic");
            heuristic_evaluation(message)
        }
    }
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}
