//! 作答时的渲染分组
//!
//! 后端下发的扁平题目没有题组信息，这里按上下文重新分组，
//! 保证共享的模板只渲染一次。

use crate::models::question::{QuestionRecord, QuestionType, RecordId};
use crate::services::tag_parser;
use crate::services::template::{self, RenderedTemplate};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// 共享同一上下文的题目
#[derive(Debug, Clone, PartialEq)]
pub struct ContextGroup {
    /// 第一道题的原始上下文
    pub shared_context: String,
    pub context_type: QuestionType,
    /// 去掉子类型标记后的说明
    pub instructions: String,
    pub members: Vec<QuestionRecord>,
}

impl ContextGroup {
    /// 渲染共享模板，成员题目不再单独渲染
    pub fn render(&self) -> RenderedTemplate {
        template::parse_template(&self.shared_context, &self.members)
    }
}

/// 渲染分组
#[derive(Debug, Clone, PartialEq)]
pub enum RenderGroup {
    Context(ContextGroup),
    Individual(QuestionRecord),
}

impl RenderGroup {
    /// 分组包含的题目数
    pub fn question_count(&self) -> usize {
        match self {
            RenderGroup::Context(group) => group.members.len(),
            RenderGroup::Individual(_) => 1,
        }
    }
}

/// 表格题的渲染结果
#[derive(Debug, Clone, PartialEq)]
pub enum TableView {
    /// 第一道同表格的题目负责渲染整张表
    Anchor(RenderedTemplate),
    /// 同一张表已由 anchor 渲染
    Covered { anchor: RecordId },
}

/// 压缩空白，用于比较上下文
pub fn normalize_context(context: &str) -> String {
    context.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 去掉重复出现的题目，保留第一次出现
pub fn dedup_by_identity(records: &[QuestionRecord]) -> Vec<QuestionRecord> {
    let mut seen: HashSet<&RecordId> = HashSet::new();
    let mut unique = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(&record.id) {
            unique.push(record.clone());
        } else {
            debug!("跳过重复题目: {}", record.id);
        }
    }
    unique
}

/// 生成作答时的渲染分组
///
/// 只有依赖上下文的题型按上下文合并；TABLE_COMPLETION 从不合并，由表格渲染自行处理同表题目。
/// 分组位置取组内第一道题的位置。
pub fn plan_render(records: &[QuestionRecord]) -> Vec<RenderGroup> {
    let records = dedup_by_identity(records);
    let mut groups: Vec<RenderGroup> = Vec::new();
    let mut index_by_context: HashMap<String, usize> = HashMap::new();

    for record in records {
        if !record.question_type.is_context_bearing() || !record.has_context() {
            groups.push(RenderGroup::Individual(record));
            continue;
        }

        let normalized = normalize_context(&record.context);
        match index_by_context.get(&normalized) {
            Some(&index) => {
                if let RenderGroup::Context(group) = &mut groups[index] {
                    group.members.push(record);
                }
            }
            None => {
                index_by_context.insert(normalized, groups.len());
                groups.push(RenderGroup::Context(ContextGroup {
                    shared_context: record.context.clone(),
                    context_type: record.question_type.clone(),
                    instructions: tag_parser::parse(&record.set_instructions).stripped_text,
                    members: vec![record],
                }));
            }
        }
    }

    groups
}

/// 渲染表格题
///
/// 同一上下文的 TABLE_COMPLETION 题目共用一张表，由其中第一道题渲染
pub fn render_table(question: &QuestionRecord, all: &[QuestionRecord]) -> TableView {
    let normalized = normalize_context(&question.context);
    let siblings: Vec<QuestionRecord> = dedup_by_identity(all)
        .into_iter()
        .filter(|q| {
            q.question_type == QuestionType::TableCompletion
                && normalize_context(&q.context) == normalized
        })
        .collect();

    match siblings.first() {
        Some(anchor) if anchor.id != question.id => TableView::Covered {
            anchor: anchor.id.clone(),
        },
        _ => {
            let candidates = if siblings.is_empty() {
                std::slice::from_ref(question)
            } else {
                siblings.as_slice()
            };
            TableView::Anchor(template::parse_template(&question.context, candidates))
        }
    }
}
