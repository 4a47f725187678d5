// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Gemini provider - the default backend.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::providers::schema::translate_schema;
use crate::types::{
    CompletionResponse, ContentBlock, FinishReason, Message, MessageContent, Provider, Role,
    ToolCall, ToolDefinition, Usage,
};

pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

fn role_to_gemini(role: &Role) -> &'static str {
    match role {
        Role::User | Role::System => "user",
        Role::Assistant => "model",
    }
}

fn block_to_part(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text { text } => json!({"text": text}),
        ContentBlock::ToolUse { name, input, .. } => json!({
            "functionCall": {"name": name, "args": input},
        }),
        ContentBlock::ToolResult { content, .. } => json!({"text": content}),
    }
}

fn message_to_content(message: &Message) -> Value {
    let parts: Vec<Value> = match &message.content {
        MessageContent::Text(text) => vec![json!({"text": text})],
        MessageContent::Blocks(blocks) => blocks.iter().map(block_to_part).collect(),
    };
    json!({"role": role_to_gemini(&message.role), "parts": parts})
}

fn tools_to_gemini(tools: &[ToolDefinition]) -> Value {
    let declarations: Vec<Value> = tools
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "parameters": translate_schema(&t.parameters),
            })
        })
        .collect();
    json!([{"functionDeclarations": declarations}])
}

fn finish_reason_from_gemini(reason: &str, has_tool_calls: bool) -> FinishReason {
    if has_tool_calls {
        return FinishReason::ToolCalls;
    }
    match reason {
        "MAX_TOKENS" => FinishReason::MaxTokens,
        "STOP" | "" => FinishReason::Stop,
        _ => FinishReason::Stop,
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        transcript: &[Message],
        tools: Option<&[ToolDefinition]>,
        system_instruction: Option<&str>,
    ) -> Result<CompletionResponse, ProviderError> {
        let contents: Vec<Value> = transcript.iter().map(message_to_content).collect();

        let mut body = json!({"contents": contents});
        if let Some(system) = system_instruction {
            body["system_instruction"] = json!({"parts": [{"text": system}]});
        }
        if let Some(tools) = tools {
            if !tools.is_empty() {
                body["tools"] = tools_to_gemini(tools);
            }
        }

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: "Gemini".to_string(),
                source: e,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: "Gemini".to_string(),
                message: format!("{status}: {text}"),
            });
        }

        let payload: Value = response.json().await.map_err(|e| ProviderError::Transport {
            provider: "Gemini".to_string(),
            source: e,
        })?;

        let candidate = payload
            .get("candidates")
            .and_then(|c| c.get(0))
            .ok_or_else(|| ProviderError::Decode {
                provider: "Gemini".to_string(),
                message: "response contained no candidates".to_string(),
            })?;

        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .cloned()
            .unwrap_or_default();

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for (idx, part) in parts.iter().enumerate() {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                content.push_str(text);
            } else if let Some(call) = part.get("functionCall") {
                let name = call
                    .get("name")
                    .and_then(|n| n.as_str())
                    .unwrap_or_default()
                    .to_string();
                let input = call.get("args").cloned().unwrap_or_else(|| json!({}));
                tool_calls.push(ToolCall {
                    id: format!("call_{idx}"),
                    name,
                    input,
                });
            }
        }

        let raw_finish = candidate
            .get("finishReason")
            .and_then(|r| r.as_str())
            .unwrap_or("STOP");
        let finish_reason = finish_reason_from_gemini(raw_finish, !tool_calls.is_empty());

        let usage = payload.get("usageMetadata").map(|u| Usage {
            input_tokens: u.get("promptTokenCount").and_then(|v| v.as_u64()).unwrap_or(0),
            output_tokens: u
                .get("candidatesTokenCount")
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
        });

        Ok(CompletionResponse {
            content,
            tool_calls,
            usage,
            finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_translates_to_user_role() {
        let message = Message::user("hi");
        let content = message_to_content(&message);
        assert_eq!(content["role"], "user");
        assert_eq!(content["parts"][0]["text"], "hi");
    }

    #[test]
    fn assistant_role_translates_to_model() {
        let message = Message::assistant("hi");
        let content = message_to_content(&message);
        assert_eq!(content["role"], "model");
    }

    #[test]
    fn tool_use_block_becomes_function_call() {
        let message = Message {
            role: Role::Assistant,
            content: MessageContent::Blocks(vec![ContentBlock::tool_use(
                "call_1",
                "read_file",
                json!({"path": "a.txt"}),
            )]),
        };
        let content = message_to_content(&message);
        assert_eq!(content["parts"][0]["functionCall"]["name"], "read_file");
    }

    #[test]
    fn presence_of_tool_calls_forces_tool_calls_finish_reason() {
        assert_eq!(finish_reason_from_gemini("STOP", true), FinishReason::ToolCalls);
        assert_eq!(finish_reason_from_gemini("MAX_TOKENS", false), FinishReason::MaxTokens);
    }
}
