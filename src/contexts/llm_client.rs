use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// System prompt used when a request does not bring its own
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert in YouTrack workflow scripting. \
Your task is to help generate high-quality workflow scripts for YouTrack based on user requirements. \
Provide detailed, well-structured, and efficient code that follows best practices.";

/// System prompt for the code flavor of completion
pub const CODE_SYSTEM_PROMPT: &str = "You are an expert in JavaScript programming, specializing in YouTrack workflow scripts. \
Your task is to generate high-quality, efficient, and well-documented JavaScript code \
for YouTrack workflow scripts based on the user's requirements. \
Provide only the code without any additional explanations or markdown formatting.";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const CODE_TEMPERATURE: f32 = 0.2;

/// Errors that can occur while talking to the LLM service
#[derive(Debug)]
pub enum LlmError {
    /// The request never produced an HTTP response
    Transport(String),
    /// The service answered with a non-success status
    Status(u16, String),
    /// The response body could not be decoded
    Decode(String),
    /// The response carried no completion
    EmptyResponse,
    ModelNotFound(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LlmError::Transport(details) => write!(f, "LLM request failed: {}", details),
            LlmError::Status(code, body) => {
                write!(f, "LLM service returned status {}: {}", code, body)
            }
            LlmError::Decode(details) => write!(f, "Failed to decode LLM response: {}", details),
            LlmError::EmptyResponse => write!(f, "No content in response"),
            LlmError::ModelNotFound(stage) => write!(f, "No model configured for stage '{}'", stage),
        }
    }
}

impl std::error::Error for LlmError {}

/// A model that can serve a stage
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    /// Overrides the temperature requested by the stage
    pub temperature: Option<f32>,
}

/// Trait for resolving the model each pipeline stage talks to
pub trait ModelRegistry {
    fn get_model(&self, stage: &str) -> Result<Model, LlmError>;
}

/// One chat completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Pipeline stage issuing the call, used for model selection and logging
    pub stage: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(stage: &str, prompt: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            prompt: prompt.into(),
            system_prompt: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Anything that can answer a prompt with text.
pub trait LlmClient {
    /// Generic chat completion.
    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Code completion: code system prompt, low temperature, markdown fences stripped.
    fn complete_code(&self, stage: &str, prompt: &str) -> Result<String, LlmError> {
        let request = CompletionRequest::new(stage, prompt)
            .with_system_prompt(CODE_SYSTEM_PROMPT)
            .with_temperature(CODE_TEMPERATURE);
        self.complete(&request)
            .map(|content| extract_fenced_code(&content))
    }
}

impl<T: LlmClient + ?Sized> LlmClient for &T {
    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        (**self).complete(request)
    }
}

/// Pulls the code out of a response that may wrap it in markdown fences.
///
/// All fenced regions are concatenated in order, separated by a blank line.
/// A fence left open at the end of the response still counts as a region.
/// Without any fence the whole response is the code.
pub fn extract_fenced_code(content: &str) -> String {
    if !content.contains("```") {
        return content.to_string();
    }

    let mut blocks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_block = false;

    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            if in_block {
                blocks.push(current.join("\n"));
                current.clear();
            }
            in_block = !in_block;
        } else if in_block {
            current.push(line);
        }
    }

    if in_block && !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    if blocks.is_empty() {
        content.to_string()
    } else {
        blocks.join("\n\n")
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible chat completions endpoint
pub struct ChatCompletionsClient<M: ModelRegistry> {
    api_url: String,
    api_key: String,
    max_tokens: u32,
    models: M,
    http: reqwest::blocking::Client,
}

impl<M: ModelRegistry> ChatCompletionsClient<M> {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, models: M) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            max_tokens: 4000,
            models,
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl<M: ModelRegistry> fmt::Debug for ChatCompletionsClient<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("api_url", &self.api_url)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl<M: ModelRegistry> LlmClient for ChatCompletionsClient<M> {
    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let model = self.models.get_model(&request.stage)?;
        let temperature = model.temperature.unwrap_or(request.temperature);

        let system_prompt = request
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let body = ChatCompletionRequest {
            model: &model.name,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            temperature,
            max_tokens: self.max_tokens,
        };

        debug!(stage = %request.stage, model = %model.name, temperature, "sending chat completion");

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(LlmError::Status(status.as_u16(), text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct EchoClient {
        requests: RefCell<Vec<CompletionRequest>>,
        reply: String,
    }

    impl LlmClient for EchoClient {
        fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.requests.borrow_mut().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_extract_without_fences_returns_everything() {
        let content = "const x = 1;\nexports.rule = x;";
        assert_eq!(extract_fenced_code(content), content);
    }

    #[test]
    fn test_extract_joins_two_blocks_with_blank_line() {
        let content = "Here you go:\n```javascript\nconst a = 1;\n```\nAnd the rule:\n```\nexports.rule = a;\n```\nDone.";
        assert_eq!(
            extract_fenced_code(content),
            "const a = 1;\n\nexports.rule = a;"
        );
    }

    #[test]
    fn test_extract_keeps_unterminated_block() {
        let content = "```js\nconst a = 1;\nconst b = 2;";
        assert_eq!(extract_fenced_code(content), "const a = 1;\nconst b = 2;");
    }

    #[test]
    fn test_complete_code_uses_code_flavor() {
        let client = EchoClient {
            requests: RefCell::new(Vec::new()),
            reply: "```js\nexports.rule = 1;\n```".to_string(),
        };

        let code = client.complete_code("generation", "write it").unwrap();
        assert_eq!(code, "exports.rule = 1;");

        let requests = client.requests.borrow();
        assert_eq!(requests[0].stage, "generation");
        assert_eq!(requests[0].temperature, CODE_TEMPERATURE);
        assert_eq!(requests[0].system_prompt.as_deref(), Some(CODE_SYSTEM_PROMPT));
    }

    #[test]
    fn test_request_builder_defaults() {
        let request = CompletionRequest::new("reasoning", "hello");
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert!(request.system_prompt.is_none());
    }
}
