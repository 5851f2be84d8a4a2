use crate::error::{QaError, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The external text-generation collaborator: one prompt in, one text out.
/// The trait seam keeps the pipeline testable without network access.
pub trait Generator {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Resolve the credential once at startup. A missing key is a fatal
/// precondition, never a per-call retry case.
pub fn api_key_from_env() -> Result<String> {
    std::env::var("OPENAI_API_KEY").map_err(|_| QaError::MissingApiKey)
}

/// Blocking OpenAI-compatible chat-completions client.
pub struct LlmClient {
    client: HttpClient,
    model: String,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(model: &str, api_key: &str) -> Result<Self> {
        Self::with_base_url(model, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(model: &str, api_key: &str, base_url: &str) -> Result<Self> {
        let client = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            model: model.to_string(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Generator for LlmClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: String,
        }

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Deserialize)]
        struct ErrorBody {
            message: String,
        }

        let url = format!("{}/chat/completions", self.base_url);
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| QaError::Generation(e.to_string()))?,
        );

        let req = Request {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self.client.post(url).headers(headers).json(&req).send()?;
        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorResponse>()
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(QaError::Generation(message));
        }

        let body: Response = response.json()?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| QaError::MalformedResponse("response contained no choices".into()))?;
        Ok(choice.message.content)
    }
}
