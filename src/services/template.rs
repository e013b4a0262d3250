//! 占位符模板引擎
//!
//! 上下文模板有两种形式：
//! - 结构化表格：JSON 对象 `{"title"?, "columns", "rows"}`
//! - 线性文本：普通文本或 Markdown，含 `|` 的行按表格行处理
//!
//! 模板中的 `___N___` 是占位符，N 对应题目的 `orderInTest`。
//! 占位符绑定的是题目标识，答案的读写始终以题目标识为键。

use crate::error::TemplateError;
use crate::models::answer_sheet::AnswerSheet;
use crate::models::question::{QuestionRecord, RecordId};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"___(\d+)___").expect("占位符正则无效"));

/// 结构化表格的序列化格式
#[derive(Debug, Clone, Deserialize)]
struct StructuredTable {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "headers")]
    columns: Vec<String>,
    #[serde(alias = "cells")]
    rows: Vec<Vec<String>>,
}

/// 模板片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// 指向 `RenderedTemplate::slots` 的下标
    Slot(usize),
}

/// 一个单元格或一行文本
pub type Cell = Vec<Segment>;

/// 占位符槽位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub placeholder_number: u32,
    /// 绑定的题目，None 表示占位符找不到对应题目
    pub bound: Option<RecordId>,
}

impl Slot {
    /// 只有绑定了题目的槽位才能作答
    pub fn is_editable(&self) -> bool {
        self.bound.is_some()
    }

    /// 读取绑定题目的答案
    pub fn answer<'a>(&self, sheet: &'a AnswerSheet) -> Option<&'a str> {
        self.bound.as_ref().and_then(|id| sheet.read(id))
    }

    /// 写入绑定题目的答案，未绑定时返回 false
    pub fn write_answer(&self, sheet: &mut AnswerSheet, text: impl Into<String>) -> bool {
        match &self.bound {
            Some(id) => {
                sheet.write(id, text);
                true
            }
            None => false,
        }
    }
}

/// 表格来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    Structured,
    Markdown,
}

/// 模板版式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateLayout {
    Table {
        source: TableSource,
        title: Option<Cell>,
        header: Vec<Cell>,
        rows: Vec<Vec<Cell>>,
        /// 表格之外的其他文本行
        notes: Vec<Cell>,
    },
    Text {
        lines: Vec<Cell>,
    },
}

/// 模板解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub layout: TemplateLayout,
    pub slots: Vec<Slot>,
    /// 看起来是结构化表格但解析失败，已回退为文本解析
    pub malformed: bool,
}

impl RenderedTemplate {
    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_editable()).count()
    }

    /// 找不到对应题目的占位符编号
    pub fn unresolved(&self) -> Vec<u32> {
        self.slots
            .iter()
            .filter(|s| !s.is_editable())
            .map(|s| s.placeholder_number)
            .collect()
    }

    /// 检查模板是否可用
    ///
    /// 部分占位符找不到题目不算错误；一个占位符都没有，或全部找不到时才报错
    pub fn validate(&self, set_name: &str) -> Result<(), TemplateError> {
        if self.slots.is_empty() {
            return Err(TemplateError::NoPlaceholders {
                set_name: set_name.to_string(),
                malformed: self.malformed,
            });
        }
        if self.bound_count() == 0 {
            return Err(TemplateError::NoneResolved {
                set_name: set_name.to_string(),
                numbers: self.unresolved(),
            });
        }
        Ok(())
    }

    /// 渲染为纯文本预览
    ///
    /// 已绑定的槽位显示为 `[N: 答案]`，未绑定的显示为 `[!N 未找到题目]`
    pub fn render_plain(&self, sheet: &AnswerSheet) -> String {
        let render_cell = |cell: &Cell| -> String {
            cell.iter()
                .map(|segment| match segment {
                    Segment::Text(text) => text.clone(),
                    Segment::Slot(index) => self.render_slot(*index, sheet),
                })
                .collect()
        };
        let render_row = |row: &[Cell]| -> String {
            let cells: Vec<String> = row.iter().map(render_cell).collect();
            format!("| {} |", cells.join(" | "))
        };

        let mut out = Vec::new();
        match &self.layout {
            TemplateLayout::Table {
                title,
                header,
                rows,
                notes,
                ..
            } => {
                if let Some(title) = title {
                    out.push(render_cell(title));
                }
                if !header.is_empty() {
                    out.push(render_row(header.as_slice()));
                    out.push(format!("|{}", " --- |".repeat(header.len())));
                }
                for row in rows {
                    out.push(render_row(row.as_slice()));
                }
                out.extend(notes.iter().map(render_cell));
            }
            TemplateLayout::Text { lines } => {
                out.extend(lines.iter().map(render_cell));
            }
        }
        out.join("\n")
    }

    fn render_slot(&self, index: usize, sheet: &AnswerSheet) -> String {
        match self.slots.get(index) {
            Some(slot) if slot.is_editable() => match slot.answer(sheet) {
                Some(answer) if !answer.is_empty() => {
                    format!("[{}: {}]", slot.placeholder_number, answer)
                }
                _ => format!("[{}: _____]", slot.placeholder_number),
            },
            Some(slot) => format!("[!{} 未找到题目]", slot.placeholder_number),
            None => String::new(),
        }
    }
}

/// 上下文是否为结构化表格
pub fn is_structured_table(context: &str) -> bool {
    decode_structured(context).is_some()
}

fn decode_structured(context: &str) -> Option<StructuredTable> {
    let trimmed = context.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

/// 上下文中是否含有占位符
pub fn has_placeholders(context: &str) -> bool {
    PLACEHOLDER.is_match(context)
}

/// 解析模板并绑定占位符
///
/// `candidates` 是模板可以引用的题目集合。对相同输入总是得到相同结果，没有副作用。
pub fn parse_template(context: &str, candidates: &[QuestionRecord]) -> RenderedTemplate {
    let mut binder = Binder {
        candidates,
        slots: Vec::new(),
    };

    if let Some(table) = decode_structured(context) {
        let title = table.title.as_deref().map(|t| binder.segment(t));
        let header: Vec<Cell> = table.columns.iter().map(|c| binder.segment(c)).collect();
        let rows: Vec<Vec<Cell>> = table
            .rows
            .iter()
            .map(|row| row.iter().map(|c| binder.segment(c)).collect::<Vec<Cell>>())
            .collect();
        return RenderedTemplate {
            layout: TemplateLayout::Table {
                source: TableSource::Structured,
                title,
                header,
                rows,
                notes: Vec::new(),
            },
            slots: binder.slots,
            malformed: false,
        };
    }

    let malformed = context.trim_start().starts_with('{');
    let layout = parse_linear(context, &mut binder);
    RenderedTemplate {
        layout,
        slots: binder.slots,
        malformed,
    }
}

fn is_table_row(line: &str) -> bool {
    line.contains('|') && !is_separator_row(line)
}

fn is_separator_row(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| matches!(c, '|' | '-' | ':' | '+' | ' '))
}

fn split_cells(line: &str) -> Vec<&str> {
    let mut cells: Vec<&str> = line.split('|').map(str::trim).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

fn parse_linear(context: &str, binder: &mut Binder<'_>) -> TemplateLayout {
    let has_table = context.lines().any(is_table_row);

    if !has_table {
        let lines = context.lines().map(|line| binder.segment(line)).collect();
        return TemplateLayout::Text { lines };
    }

    let mut title = None;
    let mut table_rows: Vec<Vec<Cell>> = Vec::new();
    let mut notes = Vec::new();

    for line in context.lines() {
        if is_table_row(line) {
            table_rows.push(split_cells(line).into_iter().map(|c| binder.segment(c)).collect());
        } else if line.contains('|') || line.trim().is_empty() {
            // 分隔行与空行
            continue;
        } else if title.is_none() {
            title = Some(binder.segment(line.trim()));
        } else {
            notes.push(binder.segment(line));
        }
    }

    let mut rows = table_rows.into_iter();
    let header = rows.next().unwrap_or_default();
    TemplateLayout::Table {
        source: TableSource::Markdown,
        title,
        header,
        rows: rows.collect(),
        notes,
    }
}

struct Binder<'a> {
    candidates: &'a [QuestionRecord],
    slots: Vec<Slot>,
}

impl Binder<'_> {
    /// 切分文本并为每个占位符建立槽位
    fn segment(&mut self, text: &str) -> Cell {
        let mut cell = Vec::new();
        let mut last = 0;

        for cap in PLACEHOLDER.captures_iter(text) {
            let (Some(whole), Some(digits)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            if whole.start() > last {
                cell.push(Segment::Text(text[last..whole.start()].to_string()));
            }
            // 超出 u32 的数字不可能是题号，保留为未绑定槽位
            let (number, bound) = match digits.as_str().parse::<u32>() {
                Ok(number) => (
                    number,
                    self.candidates
                        .iter()
                        .find(|q| q.order_in_test == Some(number))
                        .map(|q| q.id.clone()),
                ),
                Err(_) => (u32::MAX, None),
            };
            self.slots.push(Slot {
                placeholder_number: number,
                bound,
            });
            cell.push(Segment::Slot(self.slots.len() - 1));
            last = whole.end();
        }

        if last < text.len() {
            cell.push(Segment::Text(text[last..].to_string()));
        }
        cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;

    fn question(id: i64, order: u32) -> QuestionRecord {
        QuestionRecord::new(id, QuestionType::FillInTheBlank).with_order(order)
    }

    #[test]
    fn test_all_placeholders_bound() {
        let template = parse_template("Name: ___1___, Age: ___2___", &[question(11, 1), question(12, 2)]);
        assert_eq!(template.slots.len(), 2);
        assert_eq!(template.bound_count(), 2);
        assert!(template.unresolved().is_empty());
        assert_eq!(template.slots[0].bound, Some(RecordId::Persisted(11)));
        assert_eq!(template.slots[1].bound, Some(RecordId::Persisted(12)));
        assert!(template.validate("Form").is_ok());
    }

    #[test]
    fn test_unresolved_placeholder_is_distinct_slot() {
        let template = parse_template("Name: ___1___, Age: ___2___", &[question(11, 1)]);
        assert_eq!(template.bound_count(), 1);
        assert_eq!(template.unresolved(), vec![2]);
        assert!(!template.slots[1].is_editable());

        let text = template.render_plain(&AnswerSheet::new());
        assert_eq!(text, "Name: [1: _____], Age: [!2 未找到题目]");
        assert!(!text.contains("___2___"));
        assert!(template.validate("Form").is_ok());
    }

    #[test]
    fn test_markdown_table_fallback() {
        let template = parse_template(
            "Title\n|A|B|\n|___5___|___6___|",
            &[question(1, 5), question(2, 6)],
        );
        assert!(!template.malformed);
        match &template.layout {
            TemplateLayout::Table {
                source,
                title,
                header,
                rows,
                ..
            } => {
                assert_eq!(*source, TableSource::Markdown);
                assert_eq!(title, &Some(vec![Segment::Text("Title".into())]));
                assert_eq!(header.len(), 2);
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0], vec![vec![Segment::Slot(0)], vec![Segment::Slot(1)]]);
            }
            other => panic!("应为表格版式: {:?}", other),
        }
        let numbers: Vec<u32> = template.slots.iter().map(|s| s.placeholder_number).collect();
        assert_eq!(numbers, vec![5, 6]);
        assert_eq!(template.bound_count(), 2);
    }

    #[test]
    fn test_placeholder_in_title_line_gets_a_slot() {
        let template = parse_template(
            "Booking ref ___1___\n|Day|Time|\n|Mon|___2___|",
            &[question(1, 1), question(2, 2)],
        );
        let numbers: Vec<u32> = template.slots.iter().map(|s| s.placeholder_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(template.bound_count(), 2);
        match &template.layout {
            TemplateLayout::Table { title, .. } => assert_eq!(
                title,
                &Some(vec![Segment::Text("Booking ref ".into()), Segment::Slot(0)])
            ),
            other => panic!("应为表格版式: {:?}", other),
        }

        let mut sheet = AnswerSheet::new();
        assert!(template.slots[0].write_answer(&mut sheet, "X42"));
        let text = template.render_plain(&sheet);
        assert!(text.starts_with("Booking ref [1: X42]\n"));
        assert!(!text.contains("___1___"));
    }

    #[test]
    fn test_structured_title_placeholder_is_bound() {
        let context = r#"{"title": "Ref ___4___", "columns": ["A"], "rows": [["___5___"]]}"#;
        let template = parse_template(context, &[question(1, 4), question(2, 5)]);
        let numbers: Vec<u32> = template.slots.iter().map(|s| s.placeholder_number).collect();
        assert_eq!(numbers, vec![4, 5]);
        assert_eq!(template.bound_count(), 2);
    }

    #[test]
    fn test_oversized_placeholder_number_is_unbound_slot() {
        let template = parse_template("Code: ___99999999999___", &[question(1, 1)]);
        assert_eq!(template.slots.len(), 1);
        assert!(!template.slots[0].is_editable());
        let text = template.render_plain(&AnswerSheet::new());
        assert!(!text.contains("___99999999999___"));
        assert!(text.contains("未找到题目"));
    }

    #[test]
    fn test_separator_rows_are_skipped() {
        let template = parse_template("| Day | Time |\n|---|:---:|\n| Mon | ___1___ |", &[question(1, 1)]);
        match &template.layout {
            TemplateLayout::Table { header, rows, title, .. } => {
                assert_eq!(title, &None);
                assert_eq!(header[0], vec![Segment::Text("Day".into())]);
                assert_eq!(rows.len(), 1);
            }
            other => panic!("应为表格版式: {:?}", other),
        }
    }

    #[test]
    fn test_structured_table() {
        let context = r#"{"title": "Timetable", "columns": ["Day", "Time"], "rows": [["Mon", "at ___3___"]]}"#;
        let template = parse_template(context, &[question(1, 3)]);
        assert!(!template.malformed);
        match &template.layout {
            TemplateLayout::Table { source, rows, .. } => {
                assert_eq!(*source, TableSource::Structured);
                assert_eq!(
                    rows[0][1],
                    vec![Segment::Text("at ".into()), Segment::Slot(0)]
                );
            }
            other => panic!("应为表格版式: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_structured_table_falls_back() {
        let template = parse_template(r#"{"rows": [["___1___"]"#, &[question(1, 1)]);
        assert!(template.malformed);
        assert_eq!(template.bound_count(), 1);
        assert!(template.validate("Broken").is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let empty = parse_template("No blanks here", &[question(1, 1)]);
        assert_eq!(
            empty.validate("Notes"),
            Err(TemplateError::NoPlaceholders {
                set_name: "Notes".into(),
                malformed: false
            })
        );

        let unresolved = parse_template("___8___ and ___9___", &[question(1, 1)]);
        assert_eq!(
            unresolved.validate("Notes"),
            Err(TemplateError::NoneResolved {
                set_name: "Notes".into(),
                numbers: vec![8, 9]
            })
        );
    }

    #[test]
    fn test_answers_are_keyed_by_question_identity() {
        let template = parse_template("___1___ then ___2___", &[question(11, 1), question(12, 2)]);
        let mut sheet = AnswerSheet::new();
        assert!(template.slots[1].write_answer(&mut sheet, "bridge"));
        assert_eq!(sheet.read(&RecordId::Persisted(12)), Some("bridge"));
        assert_eq!(template.slots[1].answer(&sheet), Some("bridge"));
        assert_eq!(template.slots[0].answer(&sheet), None);
        assert_eq!(template.render_plain(&sheet), "[1: _____] then [2: bridge]");
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let candidates = [question(1, 1)];
        let context = "Title\n|A|\n|___1___|";
        assert_eq!(parse_template(context, &candidates), parse_template(context, &candidates));
    }
}
