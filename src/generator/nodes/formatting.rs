use tracing::info;

use super::{NodeContext, NodeKind};
use crate::error::{GatewayError, NodeError};
use crate::generator::prompts::{FormattingInput, REPORT_FORMATTING_SYSTEM};
use crate::generator::state::{AgentState, StateDelta};
use crate::llm::gateway::chat_text;
use crate::utils::text::{clean_markdown_tags, remove_reasoning_from_output};

/// 将所有段落整合为最终的Markdown报告正文
pub async fn format_report(
    ctx: &NodeContext,
    state: &AgentState,
) -> Result<StateDelta, NodeError> {
    let paragraphs_data: Vec<FormattingInput<'_>> = state
        .paragraphs
        .iter()
        .map(|p| FormattingInput {
            title: &p.title,
            paragraph_latest_state: &p.latest_summary,
        })
        .collect();

    let input_message = serde_json::to_string(&paragraphs_data).map_err(|e| {
        NodeError::new(NodeKind::Format, GatewayError::InvalidOutput(e.to_string()))
    })?;
    let messages = ctx.messages(REPORT_FORMATTING_SYSTEM, input_message);

    let raw = chat_text(ctx.llm.as_ref(), &messages)
        .await
        .map_err(|e| NodeError::new(NodeKind::Format, e))?;

    let body = strip_duplicate_title(
        &clean_markdown_tags(&remove_reasoning_from_output(&raw)),
        &state.report_title,
    );
    info!(chars = body.chars().count(), "report formatted");

    Ok(StateDelta::Report { body })
}

/// 模型有时会自行输出报告一级标题，去掉与报告标题重复的那一行
fn strip_duplicate_title(body: &str, report_title: &str) -> String {
    let trimmed = body.trim_start();
    if let Some(first_line) = trimmed.lines().next()
        && let Some(heading) = first_line.strip_prefix("# ")
        && heading.trim() == report_title.trim()
    {
        return trimmed[first_line.len()..].trim().to_string();
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_duplicate_title() {
        let body = "# EV Subsidies\n\n## Summary\nfindings";
        assert_eq!(
            strip_duplicate_title(body, "EV Subsidies"),
            "## Summary\nfindings"
        );
    }

    #[test]
    fn test_keep_different_heading() {
        let body = "# Another Title\n\ntext";
        assert_eq!(strip_duplicate_title(body, "EV Subsidies"), body);
    }

    #[test]
    fn test_keep_second_level_headings() {
        let body = "## EV Subsidies\ntext";
        assert_eq!(strip_duplicate_title(body, "EV Subsidies"), body);
    }
}
