//! GeminiProvider -- concrete [`AnswerProvider`] for Google Gemini.
//!
//! Sends one non-streaming `generateContent` request per question with the
//! fixed system instruction, the conversation window, and (optionally) the
//! web search grounding tool. Grounding chunks become [`Source`] citations.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::Instrument;

use albayan_core::llm::provider::AnswerProvider;
use albayan_observe::genai_attrs;
use albayan_types::answer::{
    Answer, AnswerError, AnswerRequest, SOURCE_TITLE_PLACEHOLDER, SOURCE_URI_PLACEHOLDER,
};
use albayan_types::chat::{MessageRole, Source};
use albayan_types::config::GlobalConfig;

use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, GoogleSearch, Tool,
};

/// Persona and source-priority instruction sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "أنت مساعد ذكاء اصطناعي إسلامي \"البيان\".
مهمتك هي الإجابة على الأسئلة الدينية والفقهية والعامة بدقة واحترام، معتمداً على مصادر أهل السنة والجماعة الموثوقة.
عند البحث عن معلومات شرعية، أعط الأولوية للمعلومات المستمدة من المواقع التالية:
- إسلام ويب (Islamweb)
- موقع ابن باز (BinBaz.org.sa)
- الدرر السنية (Dorar.net)
- الإسلام سؤال وجواب (IslamQA)

كن مهذباً، واستخدم لغة عربية فصحى واضحة.
إذا كان السؤال خارج نطاق المعرفة الشرعية أو العامة، أجب بأدب.";

/// Answer text used when the model returns no text at all.
pub const EMPTY_ANSWER_TEXT: &str = "عذراً، لم أتمكن من الحصول على إجابة.";

/// Google Gemini answer provider.
///
/// # API Key Security
///
/// The key is held as an `Option<SecretString>`: a missing key is reported
/// as [`AnswerError::Configuration`] on the first call, before any network
/// I/O, so the app can still start and browse history without one.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
    temperature: f64,
    search_grounding: bool,
}

// GeminiProvider does NOT derive Debug: it holds the API key.

impl GeminiProvider {
    /// Build a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AnswerError::Configuration`] if the HTTP client cannot be
    /// constructed (e.g., TLS backend initialization failure).
    pub fn new(api_key: Option<SecretString>, config: &GlobalConfig) -> Result<Self, AnswerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AnswerError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            search_grounding: config.search_grounding,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether an API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Map an [`AnswerRequest`] onto the Gemini request body.
    ///
    /// The history window already ends with the question in the normal
    /// flow; the prompt is appended only when it does not.
    fn build_request(&self, request: &AnswerRequest) -> GenerateContentRequest {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|turn| Content::text(Some(wire_role(turn.role)), turn.text.clone()))
            .collect();

        let ends_with_prompt = request
            .history
            .last()
            .is_some_and(|t| t.role == MessageRole::User && t.text == request.prompt);
        if !ends_with_prompt {
            contents.push(Content::text(Some("user"), request.prompt.clone()));
        }

        let tools = if self.search_grounding {
            vec![Tool {
                google_search: GoogleSearch::default(),
            }]
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            contents,
            system_instruction: Some(Content::text(None, SYSTEM_INSTRUCTION)),
            tools,
            generation_config: Some(GenerationConfig {
                temperature: self.temperature,
            }),
        }
    }

    async fn send(
        &self,
        api_key: &SecretString,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AnswerError> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key.expose_secret())
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| AnswerError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), &error_body));
        }

        response
            .json()
            .await
            .map_err(|e| AnswerError::Deserialization(format!("failed to parse response: {e}")))
    }
}

fn wire_role(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Model => "model",
    }
}

/// Classify a non-success HTTP status.
fn map_status(status: u16, body: &str) -> AnswerError {
    match status {
        401 | 403 => AnswerError::AuthenticationFailed,
        429 => AnswerError::RateLimited,
        _ => AnswerError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

/// Normalize a Gemini response into an [`Answer`].
///
/// Text parts of the first candidate are concatenated; an empty result
/// becomes [`EMPTY_ANSWER_TEXT`]. Every grounding chunk that has a `web`
/// entry becomes a source, in order, with placeholders for missing fields.
fn parse_response(response: GenerateContentResponse) -> Answer {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Answer {
            text: EMPTY_ANSWER_TEXT.to_string(),
            sources: Vec::new(),
        };
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    let sources = candidate
        .grounding_metadata
        .map(|meta| {
            meta.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .map(|web| Source {
                    title: web
                        .title
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| SOURCE_TITLE_PLACEHOLDER.to_string()),
                    uri: web
                        .uri
                        .filter(|u| !u.is_empty())
                        .unwrap_or_else(|| SOURCE_URI_PLACEHOLDER.to_string()),
                })
                .collect()
        })
        .unwrap_or_default();

    Answer {
        text: if text.is_empty() {
            EMPTY_ANSWER_TEXT.to_string()
        } else {
            text
        },
        sources,
    }
}

impl AnswerProvider for GeminiProvider {
    fn name(&self) -> &str {
        genai_attrs::PROVIDER_GEMINI
    }

    async fn ask(&self, request: &AnswerRequest) -> Result<Answer, AnswerError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            AnswerError::Configuration("GEMINI_API_KEY (or API_KEY) is not set".to_string())
        })?;

        let body = self.build_request(request);
        let span = tracing::info_span!(
            "gen_ai.chat",
            "gen_ai.operation.name" = genai_attrs::OP_CHAT,
            "gen_ai.provider.name" = genai_attrs::PROVIDER_GEMINI,
            "gen_ai.request.model" = %self.model,
            "gen_ai.request.temperature" = self.temperature,
            "gen_ai.usage.input_tokens" = tracing::field::Empty,
            "gen_ai.usage.output_tokens" = tracing::field::Empty,
            "gen_ai.response.finish_reasons" = tracing::field::Empty,
            contents = body.contents.len(),
        );

        let response = self.send(api_key, &body).instrument(span.clone()).await?;

        if let Some(usage) = &response.usage_metadata {
            if let Some(n) = usage.prompt_token_count {
                span.record(genai_attrs::GEN_AI_USAGE_INPUT_TOKENS, n);
            }
            if let Some(n) = usage.candidates_token_count {
                span.record(genai_attrs::GEN_AI_USAGE_OUTPUT_TOKENS, n);
            }
        }
        if let Some(reason) = response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            span.record(genai_attrs::GEN_AI_RESPONSE_FINISH_REASONS, reason);
        }

        Ok(parse_response(response))
    }
}
