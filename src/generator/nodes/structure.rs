use serde_json::{Value, json};
use tracing::info;

use super::{NodeContext, NodeKind};
use crate::error::NodeError;
use crate::generator::prompts::{ReportStructure, report_structure_system};
use crate::generator::state::{AgentState, ParagraphState, StateDelta};
use crate::llm::gateway::{extract_with_schema, schema_of};

/// 生成报告标题与段落骨架
pub async fn generate_structure(
    ctx: &NodeContext,
    state: &AgentState,
) -> Result<StateDelta, NodeError> {
    let max_sections = ctx.config.max_sections;

    let mut user_prompt = format!("查询主题: {}", state.query);
    if let Some(context) = &state.context {
        user_prompt.push_str(&format!("\n补充信息: {}", render_context(context)));
    }

    let messages = ctx.messages(&report_structure_system(max_sections), user_prompt);
    let schema = capped_schema(max_sections);

    let structure: ReportStructure = extract_with_schema(ctx.llm.as_ref(), &messages, &schema)
        .await
        .map_err(|e| NodeError::new(NodeKind::Structure, e))?;

    let report_title = if structure.report_title.trim().is_empty() {
        state.query.clone()
    } else {
        structure.report_title.trim().to_string()
    };

    let paragraphs: Vec<ParagraphState> = structure
        .paragraphs
        .into_iter()
        .take(max_sections)
        .map(|p| ParagraphState::new(p.title, p.content))
        .collect();

    info!(
        report_title = %report_title,
        sections = paragraphs.len(),
        "report structure generated"
    );

    Ok(StateDelta::Structure {
        report_title,
        paragraphs,
    })
}

/// 在报告结构schema上附加段落数量上限
fn capped_schema(max_sections: usize) -> Value {
    let mut schema = schema_of::<ReportStructure>();
    if let Some(paragraphs) = schema
        .pointer_mut("/properties/paragraphs")
        .and_then(Value::as_object_mut)
    {
        paragraphs.insert("minItems".to_string(), json!(1));
        paragraphs.insert("maxItems".to_string(), json!(max_sections));
    }
    schema
}

fn render_context(context: &Value) -> String {
    match context {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
