use crate::config::{Config, LLMProvider};
use crate::i18n::TargetLanguage;
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;

/// DeepSearch-RS - 由Rust与AI驱动的深度调研报告生成引擎
#[derive(Parser, Debug)]
#[command(name = "deepsearch-rs")]
#[command(
    about = "Deep research engine: plans a report outline, searches and reflects on every section, and writes a Markdown report."
)]
#[command(version)]
pub struct Args {
    /// 调研主题
    pub query: String,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 附加上下文（JSON，非法JSON时按纯文本处理）
    #[arg(long)]
    pub context: Option<String>,

    /// 每个段落的反思轮数
    #[arg(long)]
    pub max_reflections: Option<usize>,

    /// 每次搜索返回的结果数
    #[arg(long)]
    pub max_search_results: Option<usize>,

    /// 单次搜索超时（秒）
    #[arg(long)]
    pub search_timeout: Option<u64>,

    /// 写入prompt的搜索内容最大字符数
    #[arg(long)]
    pub max_content_length: Option<usize>,

    /// 一次运行允许执行的最大节点数
    #[arg(long)]
    pub step_limit: Option<usize>,

    /// 报告最多包含的段落数
    #[arg(long)]
    pub max_sections: Option<usize>,

    /// LLM Provider (openai, deepseek, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 模型名称
    #[arg(long)]
    pub model: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Tavily API KEY
    #[arg(long)]
    pub tavily_api_key: Option<String>,

    /// 报告语言 (zh, en, ja)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 报告输出目录
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// 不保存报告文件
    #[arg(long)]
    pub no_save: bool,

    /// 以JSON Lines输出进度事件
    #[arg(long)]
    pub json: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 加载配置文件并用CLI参数覆盖
    pub fn into_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        // 覆盖研究参数
        let research = &mut config.research;
        if let Some(max_reflections) = self.max_reflections {
            research.max_reflections = max_reflections;
        }
        if let Some(max_search_results) = self.max_search_results {
            research.max_search_results = max_search_results;
        }
        if let Some(search_timeout) = self.search_timeout {
            research.search_timeout_secs = search_timeout;
        }
        if let Some(max_content_length) = self.max_content_length {
            research.max_content_length = max_content_length;
        }
        if let Some(step_limit) = self.step_limit {
            research.step_limit = step_limit;
        }
        if let Some(max_sections) = self.max_sections {
            research.max_sections = max_sections;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = &self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                );
            }
        }
        if let Some(llm_api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url.clone();
        }
        if let Some(llm_api_key) = &self.llm_api_key {
            config.llm.api_key = llm_api_key.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(tavily_api_key) = &self.tavily_api_key {
            config.search.api_key = tavily_api_key.clone();
        }

        // 报告语言
        if let Some(target_language_str) = &self.target_language {
            if let Ok(target_language) = target_language_str.parse::<TargetLanguage>() {
                config.target_language = target_language;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的报告语言: {}，使用默认语言 ({})",
                    target_language_str,
                    config.target_language.display_name()
                );
            }
        }

        // 输出配置
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if self.no_save {
            config.save_report = false;
        }
        config.verbose = config.verbose || self.verbose;

        config
            .research
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid research options")?;

        Ok(config)
    }

    /// 解析附加上下文，非JSON内容作为字符串传入
    pub fn context_value(&self) -> Option<Value> {
        self.context.as_ref().map(|raw| {
            serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.clone()))
        })
    }
}
