use serde::{Deserialize, Serialize};

/// 报告输出语言
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "zh")]
    #[default]
    Chinese,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::Chinese => write!(f, "zh"),
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Japanese => write!(f, "ja"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            "en" | "english" | "英文" => Ok(TargetLanguage::English),
            "ja" | "japanese" | "日本語" | "日文" => Ok(TargetLanguage::Japanese),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::Chinese => "中文",
            TargetLanguage::English => "English",
            TargetLanguage::Japanese => "日本語",
        }
    }

    /// 追加到每个系统提示词末尾的语言要求
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::Chinese => "请使用中文撰写，保证表述准确、专业，并保留来源链接。",
            TargetLanguage::English => {
                "Write in English. Keep the wording precise and professional, and keep source links intact."
            }
            TargetLanguage::Japanese => {
                "日本語で執筆してください。正確で専門的な表現を用い、出典リンクはそのまま残してください。"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("EN".parse::<TargetLanguage>().unwrap(), TargetLanguage::English);
        assert_eq!("中文".parse::<TargetLanguage>().unwrap(), TargetLanguage::Chinese);
        assert!("klingon".parse::<TargetLanguage>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for lang in [
            TargetLanguage::Chinese,
            TargetLanguage::English,
            TargetLanguage::Japanese,
        ] {
            assert_eq!(lang.to_string().parse::<TargetLanguage>().unwrap(), lang);
        }
    }
}
