//! 单元测试使用的脚本化网关

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::NodeContext;
use crate::config::ResearchConfig;
use crate::error::GatewayError;
use crate::generator::state::SearchDocument;
use crate::i18n::TargetLanguage;
use crate::llm::gateway::{ChatMessage, LlmGateway};
use crate::search::SearchGateway;

/// 根据请求的schema返回固定回复的LLM
pub struct ScriptedLlm {
    pub sections: usize,
    pub report_body: String,
    pub malformed_structure: bool,
    pub calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(sections: usize) -> Self {
        Self {
            sections,
            report_body: "## 摘要\n\n关键发现".to_string(),
            malformed_structure: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn has_property(schema: &Value, name: &str) -> bool {
    schema
        .pointer(&format!("/properties/{}", name))
        .is_some()
}

#[async_trait]
impl LlmGateway for ScriptedLlm {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        schema: Option<&Value>,
    ) -> Result<Value, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(schema) = schema else {
            return Ok(Value::String(self.report_body.clone()));
        };

        if has_property(schema, "report_title") {
            if self.malformed_structure {
                return Err(GatewayError::InvalidOutput(
                    "expected value at line 1 column 1".to_string(),
                ));
            }
            let paragraphs: Vec<Value> = (0..self.sections)
                .map(|i| json!({ "title": format!("Section {}", i + 1), "content": "plan" }))
                .collect();
            return Ok(json!({ "report_title": "Test Report", "paragraphs": paragraphs }));
        }
        if has_property(schema, "search_query") {
            return Ok(json!({ "search_query": format!("query-{}", n), "reasoning": "gap" }));
        }
        if has_property(schema, "updated_paragraph_latest_state") {
            return Ok(json!({ "updated_paragraph_latest_state": format!("updated-{}", n) }));
        }
        if has_property(schema, "paragraph_latest_state") {
            return Ok(json!({ "paragraph_latest_state": format!("summary-{}", n) }));
        }
        Err(GatewayError::InvalidOutput("unexpected schema".to_string()))
    }
}

/// 返回固定文档或固定失败的搜索网关
pub struct ScriptedSearch {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl ScriptedSearch {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SearchGateway for ScriptedSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        timeout: Duration,
    ) -> Result<Vec<SearchDocument>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GatewayError::Timeout(timeout));
        }
        Ok((0..max_results)
            .map(|i| SearchDocument {
                title: format!("{} result {}", query, i),
                url: format!("https://example.com/{}", i),
                snippet: "evidence".to_string(),
                score: None,
            })
            .collect())
    }
}

pub fn context_with(
    llm: Arc<ScriptedLlm>,
    search: Arc<ScriptedSearch>,
    config: ResearchConfig,
) -> NodeContext {
    NodeContext::new(llm, search, config, TargetLanguage::English)
}
