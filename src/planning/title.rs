//! Title Extractor：从规格文本得到项目标题

const MAX_TITLE_CHARS: usize = 120;
const UNTITLED: &str = "Untitled project";

pub trait TitleExtractor: Send + Sync {
    fn extract_title(&self, specification_text: &str) -> String;
}

/// 取第一行非空文本，去掉 Markdown 标题符号，最长 120 字符
#[derive(Debug, Default)]
pub struct HeadingTitleExtractor;

impl TitleExtractor for HeadingTitleExtractor {
    fn extract_title(&self, specification_text: &str) -> String {
        specification_text
            .lines()
            .map(|line| line.trim().trim_start_matches('#').trim())
            .find(|line| !line.is_empty())
            .map(|line| line.chars().take(MAX_TITLE_CHARS).collect::<String>())
            .unwrap_or_else(|| UNTITLED.to_string())
    }
}
