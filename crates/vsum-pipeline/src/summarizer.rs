//! Caption summarization.
//!
//! Builds the prompts, calls the configured [`LlmClient`] and turns its reply
//! into a validated [`SummaryBody`]. Replies may be strict JSON (optionally
//! inside a Markdown code fence) or the legacy
//! `$content: ...\n---\n$lang: ...\n---\n$answer: ...` framing.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};
use vsum_models::{Language, SummaryBody};

use crate::error::SummarizeError;
use crate::llm::LlmClient;
use crate::metrics::record_summary_repair;

const SYSTEM_SHORT: &str = include_str!("prompts/system_short.txt");
const SYSTEM_LONG: &str = include_str!("prompts/system_long.txt");
const USER_TEMPLATE: &str = include_str!("prompts/user.txt");
const REPAIR_TEMPLATE: &str = include_str!("prompts/repair.txt");

/// Word budget of `$content`.
pub const MAX_CONTENT_WORDS: usize = 300;
/// Word budget of `$answer`.
pub const MAX_ANSWER_WORDS: usize = 32;
/// Captions at least this long get the long-form prompt.
pub const LONG_VIDEO_SECS: u64 = 20 * 60;

/// SRT (`00:01:02,000 --> 00:01:05,500`) and VTT (`.`) cue timings.
static CUE_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}:\d{2}:\d{2})[,.]\d{3}\s*-->\s*(\d{1,2}:\d{2}:\d{2})[,.]\d{3}").unwrap()
});

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\n?(.*?)\n?```$").unwrap());

static LEGACY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*╔?\$(content|lang|answer)[ \t]*:").unwrap());

// =============================================================================
// Summarizer
// =============================================================================

/// Produces article summaries from captions.
#[derive(Clone)]
pub struct Summarizer {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Summarize `caption` into `lang`.
    ///
    /// A malformed reply gets one repair request; a second malformed reply
    /// fails with [`SummarizeError::Malformed`]. LLM failures surface as-is.
    pub async fn summarize(
        &self,
        caption: &str,
        lang: Language,
        title: &str,
    ) -> Result<SummaryBody, SummarizeError> {
        let system = select_system_prompt(caption);
        let user = render_user_prompt(title, lang, caption);

        let reply = self.llm.complete(system, &user, &self.model).await?;
        let problem = match parse_summary(&reply) {
            Ok(body) => return Ok(body),
            Err(SummarizeError::Malformed(problem)) => problem,
            Err(e) => return Err(e),
        };

        warn!(
            provider = self.llm.provider(),
            lang = %lang,
            "Malformed summary, requesting repair: {}", problem
        );
        record_summary_repair();

        let repair = format!("{}\n\n{}", user, render_repair_prompt(&problem, &reply));
        let reply = self.llm.complete(system, &repair, &self.model).await?;
        let body = parse_summary(&reply)?;
        debug!(lang = %lang, "Summary repaired");
        Ok(body)
    }
}

// =============================================================================
// Prompts
// =============================================================================

/// End time in seconds of the last cue in an SRT or VTT stream.
pub fn caption_duration_secs(caption: &str) -> Option<u64> {
    let last = CUE_TIMING.captures_iter(caption).last()?;
    parse_hms(last.get(2)?.as_str())
}

fn parse_hms(hms: &str) -> Option<u64> {
    let mut secs = 0u64;
    for part in hms.split(':') {
        secs = secs * 60 + part.parse::<u64>().ok()?;
    }
    Some(secs)
}

/// Concise prompt under twenty minutes of captions, long-form prompt otherwise.
pub fn select_system_prompt(caption: &str) -> &'static str {
    match caption_duration_secs(caption) {
        Some(secs) if secs >= LONG_VIDEO_SECS => SYSTEM_LONG,
        _ => SYSTEM_SHORT,
    }
}

pub fn render_user_prompt(title: &str, lang: Language, caption: &str) -> String {
    USER_TEMPLATE
        .replace("{title}", title)
        .replace("{lang}", lang.as_str())
        .replace("{caption}", caption)
}

fn render_repair_prompt(problem: &str, previous: &str) -> String {
    REPAIR_TEMPLATE
        .replace("{problem}", problem)
        .replace("{previous}", previous.trim())
}

// =============================================================================
// Parsing
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawSummary {
    #[serde(rename = "$content")]
    content: Option<String>,
    #[serde(rename = "$lang")]
    lang: Option<String>,
    #[serde(rename = "$answer")]
    answer: Option<String>,
    #[serde(rename = "content")]
    plain_content: Option<String>,
    #[serde(rename = "lang")]
    plain_lang: Option<String>,
    #[serde(rename = "answer")]
    plain_answer: Option<String>,
}

impl RawSummary {
    /// `$`-prefixed keys win over their plain spellings.
    fn resolve(self) -> (Option<String>, Option<String>, Option<String>) {
        (
            self.content.or(self.plain_content),
            self.lang.or(self.plain_lang),
            self.answer.or(self.plain_answer),
        )
    }
}

/// Parse and validate an LLM reply in either accepted framing.
pub fn parse_summary(raw: &str) -> Result<SummaryBody, SummarizeError> {
    let text = strip_code_fence(raw.trim());
    let fields = if text.starts_with('{') {
        parse_json(text)?
    } else {
        parse_legacy(text)?
    };
    validate(fields)
}

fn strip_code_fence(text: &str) -> &str {
    CODE_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text)
}

fn parse_json(text: &str) -> Result<RawSummary, SummarizeError> {
    if let Ok(raw) = serde_json::from_str::<RawSummary>(text) {
        return Ok(raw);
    }
    // Trailing prose after the object
    let end = text
        .rfind('}')
        .ok_or_else(|| SummarizeError::malformed("unterminated JSON object"))?;
    serde_json::from_str(&text[..=end])
        .map_err(|e| SummarizeError::malformed(format!("invalid JSON: {}", e)))
}

fn parse_legacy(text: &str) -> Result<RawSummary, SummarizeError> {
    let markers: Vec<_> = LEGACY_MARKER.captures_iter(text).collect();
    if markers.is_empty() {
        return Err(SummarizeError::malformed(
            "reply is neither a JSON object nor $content/$lang/$answer fields",
        ));
    }

    let mut raw = RawSummary::default();

    for (i, marker) in markers.iter().enumerate() {
        let (Some(whole), Some(name)) = (marker.get(0), marker.get(1)) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let is_last = i + 1 == markers.len();
        let value = clean_legacy_value(&text[whole.end()..end], is_last);

        let slot = match name.as_str() {
            "content" => &mut raw.content,
            "lang" => &mut raw.lang,
            _ => &mut raw.answer,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    Ok(raw)
}

/// Strip the framing around one field: the `---` line separating it from
/// the next marker (never present after the last field) and a closing `╗`.
fn clean_legacy_value(value: &str, is_last: bool) -> String {
    let mut value = value.trim();
    if !is_last {
        if let Some(rest) = value.strip_suffix("---") {
            if rest.is_empty() || rest.ends_with('\n') {
                value = rest.trim_end();
            }
        }
    }
    value.strip_suffix('╗').unwrap_or(value).trim_end().to_string()
}

/// Words that carry text; bare Markdown markers such as `-` or `##` do not count.
fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

fn validate(raw: RawSummary) -> Result<SummaryBody, SummarizeError> {
    let field = |value: Option<String>, name: &str| -> Result<String, SummarizeError> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SummarizeError::malformed(format!("missing ${}", name)))
    };

    let (content, lang, answer) = raw.resolve();
    let content = field(content, "content")?;
    let lang = field(lang, "lang")?.to_ascii_lowercase();
    let answer = field(answer, "answer")?;

    if lang.len() != 2 || !lang.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(SummarizeError::malformed(format!(
            "$lang must be an ISO-639-1 code, got {:?}",
            lang
        )));
    }

    let content_words = word_count(&content);
    if content_words > MAX_CONTENT_WORDS {
        return Err(SummarizeError::malformed(format!(
            "$content has {} words, limit is {}",
            content_words, MAX_CONTENT_WORDS
        )));
    }

    let answer_words = word_count(&answer);
    if answer_words > MAX_ANSWER_WORDS {
        return Err(SummarizeError::malformed(format!(
            "$answer has {} words, limit is {}",
            answer_words, MAX_ANSWER_WORDS
        )));
    }

    Ok(SummaryBody::new(content, lang, answer))
}

/// Render a summary in the legacy `$field:` framing.
pub fn render_legacy(body: &SummaryBody) -> String {
    format!(
        "$content: {}\n---\n$lang: {}\n---\n$answer: {}",
        body.content, body.lang, body.answer
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[test]
    fn test_parse_strict_json() {
        let body = parse_summary(r#"{"$content":"Hi","$lang":"en","$answer":"World"}"#).unwrap();
        assert_eq!(body, SummaryBody::new("Hi", "en", "World"));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "content": "Hi", "lang": "en", "answer": "World" })
        );
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"$content\": \"## Title\\n- one\", \"$lang\": \"PT\", \"$answer\": \"Sim.\"}\n```";
        let body = parse_summary(raw).unwrap();
        assert_eq!(body.content, "## Title\n- one");
        assert_eq!(body.lang, "pt");
    }

    #[test]
    fn test_parse_json_with_trailing_prose() {
        let raw = r#"{"$content":"Hi","$lang":"en","$answer":"World"} Hope this helps!"#;
        assert_eq!(parse_summary(raw).unwrap().answer, "World");
    }

    #[test]
    fn test_parse_legacy_framing() {
        let raw = "$content: # Heading\n\nSome **bold** text.\n---\n$lang: es\n---\n$answer: Porque sí.";
        let body = parse_summary(raw).unwrap();
        assert_eq!(body.content, "# Heading\n\nSome **bold** text.");
        assert_eq!(body.lang, "es");
        assert_eq!(body.answer, "Porque sí.");
    }

    #[test]
    fn test_parse_boxed_legacy_framing() {
        let raw = "╔$content: Hi there╗\n╔$lang: fr╗\n╔$answer: Oui.╗";
        assert_eq!(parse_summary(raw).unwrap(), SummaryBody::new("Hi there", "fr", "Oui."));
    }

    #[test]
    fn test_json_and_legacy_round_trip() {
        let from_json = parse_summary(
            r#"{"$content":"**Bold** list:\n- a\n- b","$lang":"de","$answer":"Wie? So."}"#,
        )
        .unwrap();
        let from_legacy = parse_summary(&render_legacy(&from_json)).unwrap();
        assert_eq!(from_legacy, from_json);

        let ruled = SummaryBody::new("## Intro\n\nText\n\n---", "en", "World ---");
        assert_eq!(parse_summary(&render_legacy(&ruled)).unwrap(), ruled);
    }

    #[test]
    fn test_dollar_keys_win_over_plain_keys() {
        let body = parse_summary(
            r#"{"$content":"Hi","content":"ignored","$lang":"en","lang":"xx","answer":"World"}"#,
        )
        .unwrap();
        assert_eq!(body, SummaryBody::new("Hi", "en", "World"));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = parse_summary(r#"{"$content":"Hi","$lang":"en"}"#).unwrap_err();
        assert!(matches!(err, SummarizeError::Malformed(ref m) if m.contains("$answer")));

        let err = parse_summary(r#"{"$content":"Hi","$lang":"en","$answer":"  "}"#).unwrap_err();
        assert!(matches!(err, SummarizeError::Malformed(_)));
    }

    #[test]
    fn test_word_budgets() {
        let long_answer = vec!["word"; MAX_ANSWER_WORDS + 1].join(" ");
        let raw = serde_json::json!({ "$content": "Hi", "$lang": "en", "$answer": long_answer });
        assert!(parse_summary(&raw.to_string()).is_err());

        let content = vec!["word"; MAX_CONTENT_WORDS].join(" ") + "\n- ## --";
        let raw = serde_json::json!({ "$content": content, "$lang": "en", "$answer": "ok" });
        assert!(parse_summary(&raw.to_string()).is_ok());
    }

    #[test]
    fn test_invalid_lang_code() {
        let err = parse_summary(r#"{"$content":"Hi","$lang":"english","$answer":"x"}"#).unwrap_err();
        assert!(err.to_string().contains("ISO-639-1"));
    }

    #[test]
    fn test_plain_prose_is_malformed() {
        assert!(parse_summary("Sure! Here is your summary.").is_err());
    }

    #[test]
    fn test_caption_duration() {
        let srt = "1\n00:00:01,000 --> 00:00:04,000\nhi\n\n2\n00:21:10,500 --> 00:21:12,000\nbye\n";
        assert_eq!(caption_duration_secs(srt), Some(21 * 60 + 12));

        let vtt = "WEBVTT\n\n00:00:01.000 --> 00:03:20.000 align:start position:0%\nhey\n";
        assert_eq!(caption_duration_secs(vtt), Some(200));

        assert_eq!(caption_duration_secs("no timings here"), None);
    }

    #[test]
    fn test_prompt_selection() {
        let short = "1\n00:00:01,000 --> 00:19:59,000\nhi\n";
        let long = "1\n00:00:01,000 --> 01:02:03,000\nhi\n";
        assert_eq!(select_system_prompt(short), SYSTEM_SHORT);
        assert_eq!(select_system_prompt(long), SYSTEM_LONG);
        assert_eq!(select_system_prompt("untimed"), SYSTEM_SHORT);
    }

    #[test]
    fn test_user_prompt_carries_inputs() {
        let prompt = render_user_prompt("Why is the sky blue?", Language::It, "captions here");
        assert!(prompt.contains("Why is the sky blue?"));
        assert!(prompt.contains("Language: it"));
        assert!(prompt.contains("captions here"));
    }

    struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        fn provider(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, _system: &str, user: &str, _model: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(user.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::permanent("no scripted reply")))
        }
    }

    #[tokio::test]
    async fn test_summarize_first_reply_ok() {
        let llm = ScriptedLlm::new(vec![Ok(
            r#"{"$content":"Hi","$lang":"en","$answer":"World"}"#.into(),
        )]);
        let summarizer = Summarizer::new(llm.clone(), "deepseek-chat");
        let body = summarizer.summarize("caption", Language::En, "Title").await.unwrap();
        assert_eq!(body, SummaryBody::new("Hi", "en", "World"));
        assert_eq!(llm.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_summarize_repairs_once() {
        let llm = ScriptedLlm::new(vec![
            Ok("I cannot do JSON today".into()),
            Ok(r#"{"$content":"Fixed","$lang":"en","$answer":"Yes"}"#.into()),
        ]);
        let summarizer = Summarizer::new(llm.clone(), "m");
        let body = summarizer.summarize("caption", Language::En, "Title").await.unwrap();
        assert_eq!(body.content, "Fixed");

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("I cannot do JSON today"));
    }

    #[tokio::test]
    async fn test_summarize_gives_up_after_repair() {
        let llm = ScriptedLlm::new(vec![Ok("nope".into()), Ok("still nope".into())]);
        let summarizer = Summarizer::new(llm, "m");
        let err = summarizer.summarize("caption", Language::En, "Title").await.unwrap_err();
        assert!(matches!(err, SummarizeError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_llm_errors_are_not_repaired() {
        let llm = ScriptedLlm::new(vec![Err(LlmError::permanent("401 Unauthorized"))]);
        let summarizer = Summarizer::new(llm.clone(), "m");
        let err = summarizer.summarize("caption", Language::En, "Title").await.unwrap_err();
        assert!(matches!(err, SummarizeError::Llm(_)));
        assert_eq!(llm.prompts.lock().unwrap().len(), 1);
    }
}
