//! LLM网关契约 - 编排引擎只通过该接口访问模型

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// 对话补全网关
///
/// 提供`schema`时返回符合该schema的JSON值；否则返回`Value::String`形式的文本。
/// 调用失败或输出无法通过schema校验时必须返回可区分的错误。
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        schema: Option<&Value>,
    ) -> Result<Value, GatewayError>;
}

/// 生成类型`T`对应的JSON Schema
pub fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null)
}

/// 结构化提取：按`T`的schema请求并反序列化
pub async fn extract<T>(
    gateway: &dyn LlmGateway,
    messages: &[ChatMessage],
) -> Result<T, GatewayError>
where
    T: JsonSchema + DeserializeOwned,
{
    extract_with_schema(gateway, messages, &schema_of::<T>()).await
}

/// 使用调用方调整过的schema（例如附加数组长度上限）进行结构化提取
pub async fn extract_with_schema<T>(
    gateway: &dyn LlmGateway,
    messages: &[ChatMessage],
    schema: &Value,
) -> Result<T, GatewayError>
where
    T: DeserializeOwned,
{
    let value = gateway.chat(messages, Some(schema)).await?;
    serde_json::from_value(value).map_err(|e| GatewayError::InvalidOutput(e.to_string()))
}

/// 自由文本对话
pub async fn chat_text(
    gateway: &dyn LlmGateway,
    messages: &[ChatMessage],
) -> Result<String, GatewayError> {
    match gateway.chat(messages, None).await? {
        Value::String(text) => Ok(text),
        Value::Object(map) if map.get("content").is_some_and(Value::is_string) => Ok(map
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()),
        other => Ok(other.to_string()),
    }
}
