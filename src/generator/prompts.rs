//! 各节点使用的提示词与结构化输出类型

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 报告大纲中的单个段落
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ParagraphPlan {
    /// 段落标题
    pub title: String,
    /// 该段落预期覆盖的内容
    pub content: String,
}

/// 报告结构
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReportStructure {
    pub report_title: String,
    pub paragraphs: Vec<ParagraphPlan>,
}

/// 搜索计划（首次搜索与反思搜索共用）
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchPlan {
    pub search_query: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FirstSummary {
    pub paragraph_latest_state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReflectionSummary {
    pub updated_paragraph_latest_state: String,
}

/// 格式化节点的单段输入
#[derive(Debug, Clone, Serialize)]
pub struct FormattingInput<'a> {
    pub title: &'a str,
    pub paragraph_latest_state: &'a str,
}

pub fn report_structure_system(max_sections: usize) -> String {
    format!(
        r#"你是一位深度研究专家，擅长为一个研究主题规划报告结构。
给定一个查询主题，请规划一份研究报告：给出报告标题，以及按逻辑顺序排列的段落，每个段落包含标题与预期内容。

要求：
1. 段落覆盖背景、现状与关键数据、主要观点与争议、影响分析、趋势与建议等维度，按主题实际情况取舍；
2. 段落之间不重复，排序符合分析与决策的逻辑流程；
3. 最多保留{}个段落。"#,
        max_sections
    )
}

pub const FIRST_SEARCH_SYSTEM: &str = r#"你是一位搜索与情报检索专家。你将获得报告中一个段落的标题与预期内容，需要为该段落生成一条最能获取有效资料的网络搜索查询。
搜索策略：
- 使用具体的关键词组合，必要时加入时间范围、地域或来源限定；
- 查询应能返回代表性的报道、统计数据或权威来源；
- 在reasoning中简要说明查询的设计思路。"#;

pub const FIRST_SUMMARY_SYSTEM: &str = r#"你是一位专业的研究分析师。你将获得搜索查询、搜索结果以及正在撰写的段落，请基于搜索结果撰写该段落的内容。
要求：
- 只使用搜索结果中能找到依据的事实，关键数据与观点注明来源链接；
- 结构清晰，信息密度高，避免空话；
- 搜索结果为空时，基于段落预期内容给出审慎的概述，并指出缺少资料。"#;

pub const REFLECTION_SYSTEM: &str = r#"你是一位批判性思维专家，擅长发现知识盲点。你将获得段落的标题、预期内容以及当前已写好的段落正文。
请审视当前正文，找出最重要的一个信息缺口（缺少的数据、未覆盖的角度、需要核实的说法），并生成一条用于补全该缺口的网络搜索查询，在reasoning中说明缺口是什么。"#;

pub const REFLECTION_SUMMARY_SYSTEM: &str = r#"你是一位专业的内容总结专家。你正在迭代完善一个段落，将获得新的搜索查询、搜索结果以及段落当前的最新内容。
请用新的搜索结果丰富段落内容：
- 严格只做补充，绝不删除当前内容中已有的关键信息；
- 新增的事实注明来源链接；
- 保持段落结构连贯，合并重复表述。"#;

pub const REPORT_FORMATTING_SYSTEM: &str = r#"你是一位研究报告撰写者。你将获得一个JSON数组，包含报告所有段落的标题与最终内容，请将其整理为一份可发布的Markdown报告。
报告应包含：摘要（关键发现）、每个段落的详细内容（保留数据点与来源链接）、结论与行动建议。
注意：
- 不要输出报告的一级标题，标题会另行添加，段落使用二级标题；
- 直接输出Markdown正文，不要输出推理过程，也不要用代码块包裹。"#;
