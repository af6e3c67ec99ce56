//! 模型输出的后处理与搜索结果的prompt格式化

use regex::Regex;
use std::sync::LazyLock;

use crate::generator::state::SearchDocument;

static REASONING_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(think|thinking|reasoning)>.*?</(think|thinking|reasoning)>")
        .expect("valid reasoning regex")
});

static OPENING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^```[a-z]*[ \t]*\r?\n").expect("valid fence regex")
});

/// 移除推理模型输出中的`<think>`等推理过程块
pub fn remove_reasoning_from_output(text: &str) -> String {
    REASONING_BLOCK.replace_all(text, "").trim().to_string()
}

/// 去掉包裹整段输出的```markdown代码围栏
pub fn clean_markdown_tags(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let without_open = OPENING_FENCE.replace(trimmed, "");
    let body = without_open.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}

/// 截取文本中最外层的JSON对象
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// 按字符（而非字节）截断
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// 将搜索结果格式化为prompt片段，总长度不超过`max_length`个字符
pub fn format_search_results_for_prompt(results: &[SearchDocument], max_length: usize) -> String {
    if results.is_empty() {
        return "（本次搜索没有返回结果）".to_string();
    }

    let per_document = (max_length / results.len()).max(1);
    let mut formatted = String::new();

    for (i, doc) in results.iter().enumerate() {
        let snippet = truncate_chars(&doc.snippet, per_document);
        formatted.push_str(&format!(
            "[{}] {}\n来源: {}\n{}\n\n",
            i + 1,
            doc.title,
            doc.url,
            snippet
        ));
    }

    truncate_chars(formatted.trim_end(), max_length).to_string()
}
