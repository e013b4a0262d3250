//! 题组子类型目录
//!
//! 子类型以 `[SUBTYPE:<value>]` 标记嵌在题组说明里，比 `type` 更细。
//! 这里维护子类型到显示名称的映射，以及没有标记时的内容嗅探规则。

use crate::models::question::QuestionType;
use serde::{Deserialize, Serialize};

pub const NOTE_COMPLETION: &str = "NOTE_COMPLETION";
pub const FORM_FILLING: &str = "FORM_FILLING";
pub const TABLE_COMPLETION: &str = "TABLE_COMPLETION";
pub const MAP_LABELLING: &str = "MAP_LABELLING";
/// 嗅探不出具体子类型时使用的通用上下文标记
pub const FLEXIBLE_CONTEXT: &str = "FLEXIBLE_CONTEXT";

static SUBTYPE_LABELS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "MCQ" => "Multiple Choice Questions",
    "MATCHING" => "Matching Questions",
    "FILL_IN_THE_BLANK" => "Fill in the Blanks",
    "TRUE_FALSE_NOT_GIVEN" => "True/False/Not Given",
    "YES_NO_NOT_GIVEN" => "Yes/No/Not Given",
    "SHORT_ANSWER" => "Short Answer Questions",
    "ESSAY" => "Essay",
    "SPEAKING_TASK" => "Speaking Task",
    "WRITING_TASK1_ACADEMIC" => "Writing Task 1 (Academic)",
    "WRITING_TASK1_GENERAL" => "Writing Task 1 (General)",
    "WRITING_TASK2" => "Writing Task 2",
    "SPEAKING_PART1" => "Speaking Part 1",
    "SPEAKING_PART2" => "Speaking Part 2",
    "SPEAKING_PART3" => "Speaking Part 3",
    "NOTE_COMPLETION" => "Note Completion",
    "TABLE_COMPLETION" => "Table Completion",
    "FORM_FILLING" => "Form Completion",
    "FORM_COMPLETION" => "Form Completion",
    "SENTENCE_COMPLETION" => "Sentence Completion",
    "SUMMARY_COMPLETION" => "Summary Completion",
    "MAP_LABELLING" => "Map/Plan Labelling",
    "FLEXIBLE_CONTEXT" => "Flexible Context",
};

/// 子类型的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtypeSource {
    /// 来自说明中的 `[SUBTYPE:...]` 标记
    Tagged,
    /// 根据上下文内容猜测，需要作者确认
    Sniffed,
    /// 作者手动设置或确认过
    Confirmed,
    /// 没有标记，沿用题型
    Inherited,
}

impl SubtypeSource {
    /// 保存时是否需要把子类型写回说明
    pub fn is_persisted(self) -> bool {
        matches!(self, SubtypeSource::Tagged | SubtypeSource::Confirmed)
    }
}

/// 获取子类型的显示名称
///
/// 未知子类型显示为 "`<type>` Questions"
pub fn display_label(subtype: &str, question_type: &QuestionType) -> String {
    match SUBTYPE_LABELS.get(subtype) {
        Some(label) => label.to_string(),
        None => format!("{} Questions", question_type),
    }
}

/// 子类型是否依赖上下文模板
pub fn requires_context(subtype: &str) -> bool {
    subtype == TABLE_COMPLETION
        || subtype == FLEXIBLE_CONTEXT
        || subtype == "FORM_COMPLETION"
        || QuestionType::parse(subtype).is_context_bearing()
}

/// 根据上下文内容猜测子类型
///
/// 只在 FILL_IN_THE_BLANK 没有子类型标记时使用，结果仅供参考
pub fn sniff_subtype(context: &str) -> &'static str {
    if crate::services::template::is_structured_table(context) {
        return TABLE_COMPLETION;
    }
    if context.contains("Notes") {
        NOTE_COMPLETION
    } else if context.contains("Form") || context.contains("FORM") {
        FORM_FILLING
    } else if context.contains("Table") || context.contains('|') {
        TABLE_COMPLETION
    } else if context.contains("Map") || context.contains("Plan") {
        MAP_LABELLING
    } else {
        FLEXIBLE_CONTEXT
    }
}
