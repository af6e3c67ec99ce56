use tracing::info;

use super::{NodeContext, NodeKind};
use crate::error::NodeError;
use crate::generator::prompts::{
    FIRST_SEARCH_SYSTEM, FIRST_SUMMARY_SYSTEM, FirstSummary, SearchPlan,
};
use crate::generator::state::{AgentState, SearchRecord, StateDelta};
use crate::llm::gateway::extract;
use crate::utils::text::format_search_results_for_prompt;

/// 为当前段落生成首次搜索查询并执行搜索
pub async fn initial_search(
    ctx: &NodeContext,
    state: &AgentState,
) -> Result<StateDelta, NodeError> {
    let Some(paragraph) = state.current_paragraph() else {
        return Ok(StateDelta::Unchanged);
    };

    let user_prompt = format!(
        "段落标题: {}\n段落预期内容: {}",
        paragraph.title, paragraph.content
    );
    let messages = ctx.messages(FIRST_SEARCH_SYSTEM, user_prompt);

    let plan: SearchPlan = extract(ctx.llm.as_ref(), &messages)
        .await
        .map_err(|e| NodeError::new(NodeKind::Search, e))?;

    let results = ctx.search_or_empty(&plan.search_query).await;
    info!(
        paragraph = %paragraph.title,
        query = %plan.search_query,
        results = results.len(),
        "seed search finished"
    );

    Ok(StateDelta::AppendSearch {
        record: SearchRecord::new(plan.search_query, results),
        reflective: false,
    })
}

/// 基于最近一次搜索结果撰写段落初稿；没有搜索记录时不做任何修改
pub async fn initial_summary(
    ctx: &NodeContext,
    state: &AgentState,
) -> Result<StateDelta, NodeError> {
    let Some(paragraph) = state.current_paragraph() else {
        return Ok(StateDelta::Unchanged);
    };
    let Some(latest_search) = paragraph.latest_search() else {
        return Ok(StateDelta::Unchanged);
    };

    let formatted_results =
        format_search_results_for_prompt(&latest_search.results, ctx.config.max_content_length);
    let user_prompt = format!(
        "查询主题: {}\n段落标题: {}\n段落预期内容: {}\n搜索查询: {}\n搜索结果:\n{}",
        state.query, paragraph.title, paragraph.content, latest_search.query, formatted_results
    );
    let messages = ctx.messages(FIRST_SUMMARY_SYSTEM, user_prompt);

    let summary: FirstSummary = extract(ctx.llm.as_ref(), &messages)
        .await
        .map_err(|e| NodeError::new(NodeKind::Summarize, e))?;

    Ok(StateDelta::Summary {
        text: summary.paragraph_latest_state,
    })
}
