use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Error, Result, bail};
use futures_util::StreamExt;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;

use crate::core::AppConfig;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ApiType {
    OpenAi,
    AzureOpenAi,
}

impl ApiType {
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "OPENAI" => Ok(Self::OpenAi),
            "AZURE_OPENAI" => Ok(Self::AzureOpenAi),
            other => bail!("Unknown API type: {}", other),
        }
    }
}

/// Provider credentials for a single request. Built from request
/// headers with the server's environment configuration as the
/// fallback. Fields are passed through opaquely, only presence is
/// checked.
#[derive(Clone, Debug)]
pub struct KeyConfiguration {
    pub api_type: ApiType,
    pub api_key: String,
    pub api_model: String,
    pub api_hostname: String,
    pub azure_api_key: String,
    pub azure_instance_name: String,
    pub azure_api_version: String,
    pub azure_deployment_name: String,
    pub azure_embedding_deployment_name: String,
}

fn header_or(headers: &HeaderMap, name: &str, fallback: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

impl KeyConfiguration {
    /// Build credentials from the server environment alone
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::from_headers(&HeaderMap::new(), config)
    }

    pub fn from_headers(headers: &HeaderMap, config: &AppConfig) -> Result<Self, Error> {
        let api_type = ApiType::parse(&header_or(headers, "x-api-type", &config.api_type))?;
        Ok(Self {
            api_type,
            api_key: header_or(headers, "x-api-key", &config.openai_api_key),
            api_model: header_or(headers, "x-api-model", &config.openai_api_model),
            api_hostname: config.openai_api_hostname.clone(),
            azure_api_key: header_or(headers, "x-azure-api-key", &config.azure_api_key),
            azure_instance_name: header_or(
                headers,
                "x-azure-instance-name",
                &config.azure_instance_name,
            ),
            azure_api_version: header_or(
                headers,
                "x-azure-api-version",
                &config.azure_api_version,
            ),
            azure_deployment_name: header_or(
                headers,
                "x-azure-deployment-name",
                &config.azure_deployment_name,
            ),
            azure_embedding_deployment_name: header_or(
                headers,
                "x-azure-embedding-deployment-name",
                &config.azure_embedding_deployment_name,
            ),
        })
    }

    /// Existence checks only
    pub fn validate(&self) -> Result<(), Error> {
        match self.api_type {
            ApiType::OpenAi => {
                if self.api_key.is_empty() {
                    bail!("Missing OpenAI API key");
                }
                if self.api_model.is_empty() {
                    bail!("Missing OpenAI API model");
                }
            }
            ApiType::AzureOpenAi => {
                if self.azure_api_key.is_empty() {
                    bail!("Missing Azure OpenAI API key");
                }
                if self.azure_instance_name.is_empty() {
                    bail!("Missing Azure OpenAI instance name");
                }
                if self.azure_deployment_name.is_empty() {
                    bail!("Missing Azure OpenAI deployment name");
                }
            }
        }
        Ok(())
    }

    fn completions_url(&self) -> String {
        match self.api_type {
            ApiType::OpenAi => format!(
                "{}/v1/chat/completions",
                self.api_hostname.trim_end_matches("/")
            ),
            ApiType::AzureOpenAi => format!(
                "https://{}.openai.azure.com/openai/deployments/{}/chat/completions?api-version={}",
                self.azure_instance_name, self.azure_deployment_name, self.azure_api_version
            ),
        }
    }
}

/// Result of draining a completion stream to the end or stopping
/// early. A cancelled stream discards any partial text.
#[derive(Debug, PartialEq)]
pub enum StreamOutcome {
    Completed(String),
    Cancelled,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Delta {
    Content { content: String },

    Stop {},
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    choices: Vec<CompletionChunkChoice>,
}

/// Send a streaming chat completion request and check the response
/// status. A non-success status surfaces the provider's response body
/// text as the error, there is no retry.
pub async fn request_completion(
    key_config: &KeyConfiguration,
    messages: &[Message],
) -> Result<reqwest::Response, Error> {
    let payload = json!({
        "model": key_config.api_model,
        "messages": messages,
        "stream": true,
    });
    let mut request = reqwest::Client::new()
        .post(key_config.completions_url())
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60 * 5))
        .json(&payload);
    request = match key_config.api_type {
        ApiType::OpenAi => request.bearer_auth(&key_config.api_key),
        ApiType::AzureOpenAi => request.header("api-key", &key_config.azure_api_key),
    };
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("Chat completion failed with status {}: {}", status, body);
    }

    Ok(response)
}

/// Drain a streaming completion response. Each chunk is decoded as
/// UTF-8, buffered to handle SSE events fragmented across HTTP/2
/// frames, and the content deltas are appended to an accumulator.
///
/// The `stop` flag is polled between reads, never during one: an
/// in-flight read completes before cancellation takes effect. On
/// cancellation the underlying request is aborted by dropping the
/// stream and all accumulated text is discarded.
///
/// Content deltas are forwarded over `tx` as they arrive. Send errors
/// are ignored so a disconnected receiver doesn't stop the drain.
pub async fn consume_stream(
    response: reqwest::Response,
    tx: Option<&mpsc::UnboundedSender<String>>,
    stop: &AtomicBool,
) -> Result<StreamOutcome, Error> {
    let mut stream = response.bytes_stream();

    let mut content_buf = String::new();
    let mut buffer = String::new();

    'outer: while let Some(chunk) = stream.next().await {
        // Returning here drops the stream which aborts the
        // underlying request
        if stop.load(Ordering::Relaxed) {
            return Ok(StreamOutcome::Cancelled);
        }

        let chunk = chunk?;
        let chunk_str = std::str::from_utf8(&chunk)?;
        buffer.push_str(chunk_str);

        // Process all complete SSE events from the buffer
        while let Some(event_end) = buffer.find("\n\n") {
            let event_data = buffer[..event_end].to_string();
            buffer = buffer[event_end + 2..].to_string();

            let event_data = event_data.trim();
            if event_data.is_empty() {
                continue;
            }
            if !event_data.starts_with("data: ") {
                continue;
            }

            let data = event_data[6..].trim();
            if data.is_empty() {
                continue;
            }
            if data == "[DONE]" {
                break 'outer;
            }

            let chunk = serde_json::from_str::<CompletionChunk>(data).inspect_err(|e| {
                tracing::error!("Parsing completion chunk failed for {}\nError: {}", data, e)
            })?;
            let Some(choice) = chunk.choices.first() else {
                continue;
            };

            match &choice.delta {
                Delta::Content { content } => {
                    content_buf += content;
                    if let Some(tx) = tx {
                        let _ = tx.send(content.clone());
                    }
                    if choice.finish_reason.is_some() {
                        break 'outer;
                    }
                }
                Delta::Stop {} => {
                    break 'outer;
                }
            }
        }
    }

    Ok(StreamOutcome::Completed(content_buf))
}
