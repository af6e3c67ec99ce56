//! LLM客户端 - 基于rig的LLM网关实现

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::LLMConfig;
use crate::error::GatewayError;
use crate::llm::gateway::{ChatMessage, LlmGateway, Role};
use crate::utils::text::{clean_markdown_tags, extract_json_block, remove_reasoning_from_output};

mod providers;

use providers::ProviderClient;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    pub fn model_info(&self) -> String {
        format!("{} ({})", self.config.provider, self.config.model)
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        info!("checking model connection: {}", self.model_info());
        let messages = [
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user("Hello"),
        ];
        match self.chat(&messages, None).await {
            Ok(_) => {
                info!("model connection ok");
                Ok(())
            }
            Err(e) => {
                warn!("model connection failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// 通用重试逻辑，用于处理异步操作的重试机制
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T, GatewayError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_retries = self.config.retry_attempts.max(1);
        let retry_delay_ms = self.config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    warn!(
                        "model call failed (attempt {} / {}): {}",
                        retries, max_retries, err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    /// 单次调用：超时控制 + 输出解析
    async fn attempt(
        &self,
        preamble: &str,
        user_prompt: &str,
        structured: bool,
    ) -> Result<Value, GatewayError> {
        let agent = self.client.create_agent(preamble, &self.config);
        let timeout = Duration::from_secs(self.config.timeout_seconds);

        let raw = tokio::time::timeout(timeout, agent.prompt(user_prompt))
            .await
            .map_err(|_| GatewayError::Timeout(timeout))?
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !structured {
            return Ok(Value::String(raw));
        }

        let cleaned = clean_markdown_tags(&remove_reasoning_from_output(&raw));
        let json_text = extract_json_block(&cleaned).unwrap_or(cleaned.as_str());
        serde_json::from_str(json_text).map_err(|e| GatewayError::InvalidOutput(e.to_string()))
    }
}

/// 将消息列表拆分为rig的preamble与用户prompt
fn split_messages(messages: &[ChatMessage], schema: Option<&Value>) -> (String, String) {
    let mut preamble = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    if let Some(schema) = schema {
        preamble.push_str(&format!(
            "\n\n只返回一个符合以下JSON Schema的JSON对象，不要输出任何额外的解释或文本：\n<OUTPUT JSON SCHEMA>\n{}\n</OUTPUT JSON SCHEMA>",
            serde_json::to_string_pretty(schema).unwrap_or_default()
        ));
    }

    let user_prompt = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| match m.role {
            Role::Assistant => format!("[assistant]\n{}", m.content),
            _ => m.content.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    (preamble, user_prompt)
}

#[async_trait]
impl LlmGateway for LLMClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        schema: Option<&Value>,
    ) -> Result<Value, GatewayError> {
        let (preamble, user_prompt) = split_messages(messages, schema);
        debug!(
            model = %self.config.model,
            structured = schema.is_some(),
            prompt_chars = preamble.len() + user_prompt.len(),
            "llm chat"
        );

        self.retry_with_backoff(|| self.attempt(&preamble, &user_prompt, schema.is_some()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_messages_moves_system_into_preamble() {
        let messages = [
            ChatMessage::system("you are a planner"),
            ChatMessage::user("topic: rust"),
        ];
        let (preamble, user) = split_messages(&messages, None);
        assert_eq!(preamble, "you are a planner");
        assert_eq!(user, "topic: rust");
    }

    #[test]
    fn test_split_messages_appends_schema_instruction() {
        let schema = json!({ "type": "object", "required": ["search_query"] });
        let (preamble, _) = split_messages(&[ChatMessage::system("sys")], Some(&schema));
        assert!(preamble.starts_with("sys"));
        assert!(preamble.contains("<OUTPUT JSON SCHEMA>"));
        assert!(preamble.contains("search_query"));
    }

    #[test]
    fn test_client_creation_with_default_config() {
        let client = LLMClient::new(LLMConfig::default());
        assert!(client.is_ok());
        assert!(client.unwrap().model_info().starts_with("openai"));
    }
}
