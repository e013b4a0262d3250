//! 子类型标记解析
//!
//! 题组说明里可能嵌有 `[SUBTYPE:<value>]` 标记，这里负责提取与去除，
//! 以及保存时重新写回。

use regex::Regex;
use std::sync::LazyLock;

/// 标记及其后紧跟的一个空格
static SUBTYPE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[SUBTYPE:([^\]]*)\] ?").expect("子类型标记正则无效"));

/// 标记解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    pub subtype: Option<String>,
    pub stripped_text: String,
}

/// 解析说明文本中的子类型标记
///
/// 取第一个标记的值；所有标记都会被去掉，所以对已去除的文本再次调用不会改变结果
pub fn parse(text: &str) -> ParsedTag {
    let Some(cap) = SUBTYPE_TAG.captures(text) else {
        return ParsedTag {
            subtype: None,
            stripped_text: text.to_string(),
        };
    };

    // 空标记 `[SUBTYPE:]` 视为没有子类型，但同样去掉
    let subtype = cap
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty());

    ParsedTag {
        subtype,
        stripped_text: SUBTYPE_TAG.replace_all(text, "").into_owned(),
    }
}

/// 将子类型标记写回说明开头
pub fn embed(subtype: &str, text: &str) -> String {
    format!("[SUBTYPE:{}] {}", subtype, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extracts_and_strips_tag() {
        let parsed = parse("[SUBTYPE:NOTE_COMPLETION] Fill the notes");
        assert_eq!(parsed.subtype.as_deref(), Some("NOTE_COMPLETION"));
        assert_eq!(parsed.stripped_text, "Fill the notes");
    }

    #[test]
    fn test_parse_without_tag_is_unchanged() {
        let parsed = parse("Fill the notes");
        assert_eq!(parsed.subtype, None);
        assert_eq!(parsed.stripped_text, "Fill the notes");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let once = parse("Read the text. [SUBTYPE:TABLE_COMPLETION] Complete the table");
        let twice = parse(&once.stripped_text);
        assert_eq!(once.stripped_text, "Read the text. Complete the table");
        assert_eq!(twice.subtype, None);
        assert_eq!(twice.stripped_text, once.stripped_text);
    }

    #[test]
    fn test_only_one_trailing_space_is_removed() {
        let parsed = parse("[SUBTYPE:MCQ]  Choose");
        assert_eq!(parsed.stripped_text, " Choose");
    }

    #[test]
    fn test_empty_tag_yields_no_subtype() {
        let parsed = parse("[SUBTYPE:] Choose");
        assert_eq!(parsed.subtype, None);
        assert_eq!(parsed.stripped_text, "Choose");
    }

    #[test]
    fn test_embed_then_parse() {
        let text = embed("FORM_FILLING", "Complete the form");
        assert_eq!(text, "[SUBTYPE:FORM_FILLING] Complete the form");
        let parsed = parse(&text);
        assert_eq!(parsed.subtype.as_deref(), Some("FORM_FILLING"));
        assert_eq!(parsed.stripped_text, "Complete the form");
    }
}
