use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 单条搜索结果文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SearchDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// 摘要片段，兼容Tavily返回的`content`字段
    #[serde(default, alias = "content")]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// 单次搜索记录，创建后不可修改，只会追加到段落的搜索历史中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub query: String,
    /// 按搜索网关返回的相关性排序
    pub results: Vec<SearchDocument>,
    pub timestamp: DateTime<Utc>,
}

impl SearchRecord {
    pub fn new(query: impl Into<String>, results: Vec<SearchDocument>) -> Self {
        Self {
            query: query.into(),
            results,
            timestamp: Utc::now(),
        }
    }
}

/// 报告中的一个段落
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphState {
    pub title: String,
    /// 工作草稿，由总结节点覆盖
    pub content: String,
    pub search_history: Vec<SearchRecord>,
    /// 段落当前的权威正文
    pub latest_summary: String,
    pub completed: bool,
    /// 本段落已执行的反思轮数
    pub reflection_count: usize,
}

impl ParagraphState {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            search_history: Vec::new(),
            latest_summary: String::new(),
            completed: false,
            reflection_count: 0,
        }
    }

    pub fn latest_search(&self) -> Option<&SearchRecord> {
        self.search_history.last()
    }
}

/// 一次研究运行的完整状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AgentState {
    pub query: String,
    /// 附加上下文（例如预先选定的热点话题），运行期间不可变
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    pub report_title: String,
    pub paragraphs: Vec<ParagraphState>,
    pub current_paragraph_index: usize,
    pub final_report: Option<String>,
    pub completed: bool,
}

/// 节点产出的状态增量，由引擎统一提交
#[derive(Debug, Clone, PartialEq)]
pub enum StateDelta {
    /// 报告标题与段落骨架
    Structure {
        report_title: String,
        paragraphs: Vec<ParagraphState>,
    },
    /// 为当前段落追加一条搜索记录，反思搜索同时递增反思计数
    AppendSearch {
        record: SearchRecord,
        reflective: bool,
    },
    /// 覆盖当前段落的草稿与最新总结
    Summary { text: String },
    /// 格式化后的报告正文，提交时在前面加上报告标题
    Report { body: String },
    Unchanged,
}

impl AgentState {
    pub fn new(query: impl Into<String>, context: Option<Value>) -> Self {
        Self {
            query: query.into(),
            context,
            ..Default::default()
        }
    }

    pub fn current_paragraph(&self) -> Option<&ParagraphState> {
        self.paragraphs.get(self.current_paragraph_index)
    }

    fn current_paragraph_mut(&mut self) -> Option<&mut ParagraphState> {
        self.paragraphs.get_mut(self.current_paragraph_index)
    }

    /// 所有段落是否已处理完毕
    pub fn all_paragraphs_done(&self) -> bool {
        self.current_paragraph_index >= self.paragraphs.len()
    }

    /// 提交节点产出的增量
    pub fn apply(&mut self, delta: StateDelta) {
        match delta {
            StateDelta::Structure {
                report_title,
                paragraphs,
            } => {
                self.report_title = report_title;
                self.paragraphs = paragraphs;
                self.current_paragraph_index = 0;
            }
            StateDelta::AppendSearch { record, reflective } => {
                if let Some(paragraph) = self.current_paragraph_mut() {
                    paragraph.search_history.push(record);
                    if reflective {
                        paragraph.reflection_count += 1;
                    }
                }
            }
            StateDelta::Summary { text } => {
                if let Some(paragraph) = self.current_paragraph_mut() {
                    paragraph.content = text.clone();
                    paragraph.latest_summary = text;
                }
            }
            StateDelta::Report { body } => {
                self.final_report = Some(format!("# {}\n\n{}", self.report_title, body));
                self.completed = true;
            }
            StateDelta::Unchanged => {}
        }
    }

    /// 结束当前段落并前进到下一段
    pub fn advance_paragraph(&mut self) {
        if let Some(paragraph) = self.current_paragraph_mut() {
            paragraph.completed = true;
        }
        if self.current_paragraph_index < self.paragraphs.len() {
            self.current_paragraph_index += 1;
        }
    }
}
