//! 工作流节点：每个节点读取状态快照，返回由引擎提交的状态增量

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tracing::warn;

use crate::config::ResearchConfig;
use crate::error::NodeError;
use crate::generator::state::{AgentState, SearchDocument, StateDelta};
use crate::i18n::TargetLanguage;
use crate::llm::gateway::{ChatMessage, LlmGateway};
use crate::search::SearchGateway;

mod formatting;
mod reflection;
mod search;
mod structure;

pub use formatting::format_report;
pub use reflection::{reflection_search, reflection_summary};
pub use search::{initial_search, initial_summary};
pub use structure::generate_structure;

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Structure,
    Search,
    #[serde(rename = "summary")]
    Summarize,
    #[serde(rename = "reflect")]
    ReflectSearch,
    #[serde(rename = "reflect_summary")]
    ReflectSummarize,
    Format,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            NodeKind::Structure => "structure",
            NodeKind::Search => "search",
            NodeKind::Summarize => "summary",
            NodeKind::ReflectSearch => "reflect",
            NodeKind::ReflectSummarize => "reflect_summary",
            NodeKind::Format => "format",
        };
        write!(f, "{}", str)
    }
}

impl NodeKind {
    /// 执行该类型对应的节点函数
    pub async fn run(
        self,
        ctx: &NodeContext,
        state: &AgentState,
    ) -> Result<StateDelta, NodeError> {
        match self {
            NodeKind::Structure => generate_structure(ctx, state).await,
            NodeKind::Search => initial_search(ctx, state).await,
            NodeKind::Summarize => initial_summary(ctx, state).await,
            NodeKind::ReflectSearch => reflection_search(ctx, state).await,
            NodeKind::ReflectSummarize => reflection_summary(ctx, state).await,
            NodeKind::Format => format_report(ctx, state).await,
        }
    }
}

/// 节点运行所需的外部依赖与参数
#[derive(Clone)]
pub struct NodeContext {
    pub llm: Arc<dyn LlmGateway>,
    pub search: Arc<dyn SearchGateway>,
    pub config: ResearchConfig,
    pub language: TargetLanguage,
}

impl NodeContext {
    pub fn new(
        llm: Arc<dyn LlmGateway>,
        search: Arc<dyn SearchGateway>,
        config: ResearchConfig,
        language: TargetLanguage,
    ) -> Self {
        Self {
            llm,
            search,
            config,
            language,
        }
    }

    /// 系统提示词 + 语言要求，再加上用户消息
    pub(crate) fn messages(&self, system_prompt: &str, user_prompt: String) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(format!(
                "{}\n\n{}",
                system_prompt,
                self.language.prompt_instruction()
            )),
            ChatMessage::user(user_prompt),
        ]
    }

    /// 执行搜索；任何网关错误都降级为空结果
    pub(crate) async fn search_or_empty(&self, query: &str) -> Vec<SearchDocument> {
        match self
            .search
            .search(
                query,
                self.config.max_search_results,
                self.config.search_timeout(),
            )
            .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!(query, error = %e, "search gateway failed, continuing without evidence");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;
