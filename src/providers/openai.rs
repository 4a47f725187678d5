// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! OpenAI provider - GPT models via the Chat Completions API.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::providers::schema::translate_schema;
use crate::types::{
    CompletionResponse, ContentBlock, FinishReason, Message, MessageContent, Provider, Role,
    ToolCall, ToolDefinition, Usage,
};

pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

fn role_to_openai(role: &Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

/// OpenAI spreads an Assistant-with-tool-calls message and a User
/// ToolResultBatch across several wire messages each (one `tool` message per
/// result), unlike Gemini/Anthropic which nest them as parts of one message.
fn message_to_openai(message: &Message) -> Vec<Value> {
    match &message.content {
        MessageContent::Text(text) => {
            vec![json!({"role": role_to_openai(&message.role), "content": text})]
        }
        MessageContent::Blocks(blocks) => {
            if message.is_tool_result_batch() {
                blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } => Some(json!({
                            "role": "tool",
                            "tool_call_id": tool_use_id,
                            "content": content,
                        })),
                        _ => None,
                    })
                    .collect()
            } else {
                let mut text = String::new();
                let mut tool_calls = Vec::new();
                for block in blocks {
                    match block {
                        ContentBlock::Text { text: t } => text.push_str(t),
                        ContentBlock::ToolUse { id, name, input } => {
                            tool_calls.push(json!({
                                "id": id,
                                "type": "function",
                                "function": {
                                    "name": name,
                                    "arguments": input.to_string(),
                                },
                            }));
                        }
                        ContentBlock::ToolResult { .. } => {}
                    }
                }
                let mut out = json!({"role": role_to_openai(&message.role)});
                out["content"] = if text.is_empty() { Value::Null } else { json!(text) };
                if !tool_calls.is_empty() {
                    out["tool_calls"] = json!(tool_calls);
                }
                vec![out]
            }
        }
    }
}

fn tools_to_openai(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": translate_schema(&t.parameters),
                },
            })
        })
        .collect()
}

fn finish_reason_from_openai(reason: &str) -> FinishReason {
    match reason {
        "tool_calls" => FinishReason::ToolCalls,
        "length" => FinishReason::MaxTokens,
        "stop" => FinishReason::Stop,
        _ => FinishReason::Stop,
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "OpenAI"
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
        let mut messages: Vec<Value> = Vec::new();
        if let Some(system) = system_instruction {
            messages.push(json!({"role": "system", "content": system}));
        }
        for message in transcript {
            messages.extend(message_to_openai(message));
        }

        let mut body = json!({"model": self.model, "messages": messages});
        if let Some(tools) = tools {
            if !tools.is_empty() {
                body["tools"] = json!(tools_to_openai(tools));
            }
        }

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: "OpenAI".to_string(),
                source: e,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: "OpenAI".to_string(),
                message: format!("{status}: {text}"),
            });
        }

        let payload: Value = response.json().await.map_err(|e| ProviderError::Transport {
            provider: "OpenAI".to_string(),
            source: e,
        })?;

        let choice = payload
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| ProviderError::Decode {
                provider: "OpenAI".to_string(),
                message: "response contained no choices".to_string(),
            })?;

        let message = choice.get("message").cloned().unwrap_or_else(|| json!({}));
        let content = message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message.get("tool_calls").and_then(|c| c.as_array()) {
            for call in calls {
                let id = call.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                let function = call.get("function").cloned().unwrap_or_else(|| json!({}));
                let name = function
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let input = function
                    .get("arguments")
                    .and_then(|v| v.as_str())
                    .and_then(|s| serde_json::from_str(s).ok())
                    .unwrap_or_else(|| json!({}));
                tool_calls.push(ToolCall { id, name, input });
            }
        }

        let raw_finish = choice
            .get("finish_reason")
            .and_then(|v| v.as_str())
            .unwrap_or("stop");
        let finish_reason = finish_reason_from_openai(raw_finish);

        let usage = payload.get("usage").map(|u| Usage {
            input_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            output_tokens: u
                .get("completion_tokens")
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
    fn tool_result_batch_becomes_one_tool_message_per_result() {
        let message = Message {
            role: Role::User,
            content: MessageContent::Blocks(vec![
                ContentBlock::tool_result("call_1", "ok", false),
                ContentBlock::tool_result("call_2", "fail", true),
            ]),
        };
        let out = message_to_openai(&message);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["role"], "tool");
        assert_eq!(out[0]["tool_call_id"], "call_1");
    }

    #[test]
    fn assistant_tool_calls_serialize_arguments_as_json_string() {
        let message = Message {
            role: Role::Assistant,
            content: MessageContent::Blocks(vec![ContentBlock::tool_use(
                "call_1",
                "read_file",
                json!({"path": "a.txt"}),
            )]),
        };
        let out = message_to_openai(&message);
        let args = out[0]["tool_calls"][0]["function"]["arguments"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(args).unwrap();
        assert_eq!(parsed["path"], "a.txt");
    }

    #[test]
    fn finish_reasons_map_correctly() {
        assert_eq!(finish_reason_from_openai("tool_calls"), FinishReason::ToolCalls);
        assert_eq!(finish_reason_from_openai("length"), FinishReason::MaxTokens);
    }
}
