use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// 文件名中保留的查询字符数上限
const QUERY_SLUG_MAX_CHARS: usize = 30;

/// 根据查询与时间生成报告文件名
pub fn report_filename(query: &str, now: &DateTime<Local>) -> String {
    format!(
        "deep_search_report_{}_{}.md",
        query_slug(query),
        now.format("%Y%m%d_%H%M%S")
    )
}

/// 只保留字母数字、空格、`-`和`_`，空格替换为下划线
fn query_slug(query: &str) -> String {
    let kept: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();

    kept.trim_end()
        .replace(' ', "_")
        .chars()
        .take(QUERY_SLUG_MAX_CHARS)
        .collect()
}

/// 将报告写入输出目录，返回文件路径
pub fn save_report(output_dir: &Path, query: &str, report: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).context(format!(
        "Failed to create output directory: {}",
        output_dir.display()
    ))?;

    let output_file_path = output_dir.join(report_filename(query, &Local::now()));
    fs::write(&output_file_path, report).context(format!(
        "Failed to write report: {}",
        output_file_path.display()
    ))?;

    Ok(output_file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_report_filename_format() {
        assert_eq!(
            report_filename("electric vehicle subsidies", &fixed_time()),
            "deep_search_report_electric_vehicle_subsidies_20250309_140507.md"
        );
    }

    #[test]
    fn test_query_slug_strips_punctuation_and_truncates() {
        assert_eq!(query_slug("what's new? (2025)"), "whats_new_2025");
        assert_eq!(query_slug("新能源汽车 补贴"), "新能源汽车_补贴");
        assert_eq!(query_slug("trailing   "), "trailing");
        assert_eq!(query_slug(&"a".repeat(50)).chars().count(), 30);
    }

    #[test]
    fn test_save_report_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("reports").join("nested");

        let path = save_report(&output_dir, "ev subsidies", "# Title\n\nbody").unwrap();

        assert!(path.starts_with(&output_dir));
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("deep_search_report_ev_subsidies_")
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Title\n\nbody");
    }
}
