//! 搜索网关契约

use async_trait::async_trait;
use std::time::Duration;

use crate::error::GatewayError;
use crate::generator::state::SearchDocument;

mod tavily;

pub use tavily::TavilyClient;

/// 关键词搜索网关，结果按相关性排序
///
/// 重试策略（如果需要）由具体实现决定，编排引擎不做重试。
#[async_trait]
pub trait SearchGateway: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        timeout: Duration,
    ) -> Result<Vec<SearchDocument>, GatewayError>;
}
