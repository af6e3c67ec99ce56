use tracing::info;

use super::{NodeContext, NodeKind};
use crate::error::NodeError;
use crate::generator::prompts::{
    REFLECTION_SUMMARY_SYSTEM, REFLECTION_SYSTEM, ReflectionSummary, SearchPlan,
};
use crate::generator::state::{AgentState, SearchRecord, StateDelta};
use crate::llm::gateway::extract;
use crate::utils::text::format_search_results_for_prompt;

/// 审视当前段落，针对一个知识缺口发起补充搜索
///
/// 新的搜索记录会写入段落的搜索历史，并使反思计数加一。
pub async fn reflection_search(
    ctx: &NodeContext,
    state: &AgentState,
) -> Result<StateDelta, NodeError> {
    let Some(paragraph) = state.current_paragraph() else {
        return Ok(StateDelta::Unchanged);
    };

    let user_prompt = format!(
        "查询主题: {}\n段落标题: {}\n段落预期内容: {}\n当前总结: {}",
        state.query, paragraph.title, paragraph.content, paragraph.latest_summary
    );
    let messages = ctx.messages(REFLECTION_SYSTEM, user_prompt);

    let plan: SearchPlan = extract(ctx.llm.as_ref(), &messages)
        .await
        .map_err(|e| NodeError::new(NodeKind::ReflectSearch, e))?;

    let results = ctx.search_or_empty(&plan.search_query).await;
    info!(
        paragraph = %paragraph.title,
        round = paragraph.reflection_count + 1,
        query = %plan.search_query,
        gap = %plan.reasoning,
        results = results.len(),
        "reflection search finished"
    );

    Ok(StateDelta::AppendSearch {
        record: SearchRecord::new(plan.search_query, results),
        reflective: true,
    })
}

/// 用最新的反思搜索结果补充段落内容；没有搜索记录时不做任何修改
pub async fn reflection_summary(
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
        "查询主题: {}\n段落标题: {}\n段落预期内容: {}\n搜索查询: {}\n搜索结果:\n{}\n当前总结: {}",
        state.query,
        paragraph.title,
        paragraph.content,
        latest_search.query,
        formatted_results,
        paragraph.latest_summary
    );
    let messages = ctx.messages(REFLECTION_SUMMARY_SYSTEM, user_prompt);

    let summary: ReflectionSummary = extract(ctx.llm.as_ref(), &messages)
        .await
        .map_err(|e| NodeError::new(NodeKind::ReflectSummarize, e))?;

    Ok(StateDelta::Summary {
        text: summary.updated_paragraph_latest_state,
    })
}
