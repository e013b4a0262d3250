use crate::models::question::{QuestionRecord, QuestionType, RecordId};
use crate::models::subtype::{self, SubtypeSource};
use serde::{Deserialize, Serialize};

/// 题组（仅用于编辑与渲染，不直接持久化）
///
/// 多道题目在 (题型, 子类型, 文章序号, 音频序号, 说明, 上下文) 完全相同时合并为一个题组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSet {
    /// 本地生成的 ID，对后端无意义
    pub id: String,
    /// 显示名称
    pub name: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// 没有标记时等于题型名称
    pub subtype: String,
    pub subtype_source: SubtypeSource,
    /// 去掉子类型标记后的说明
    pub instructions: String,
    /// 共享的上下文模板
    pub context: String,
    /// 当前文章列表中的位置（从 1 开始），不是外键
    pub passage_ordinal: Option<usize>,
    /// 当前音频列表中的位置（从 1 开始），不是外键
    pub audio_ordinal: Option<usize>,
    pub members: Vec<QuestionRecord>,
}

impl QuestionSet {
    /// 创建一个空题组，子类型沿用题型
    pub fn new(id: impl Into<String>, question_type: QuestionType) -> Self {
        let subtype = question_type.as_str().to_string();
        Self {
            id: id.into(),
            name: subtype::display_label(&subtype, &question_type),
            question_type,
            subtype,
            subtype_source: SubtypeSource::Inherited,
            instructions: String::new(),
            context: String::new(),
            passage_ordinal: None,
            audio_ordinal: None,
            members: Vec::new(),
        }
    }

    /// 是否需要上下文模板
    pub fn requires_context(&self) -> bool {
        subtype::requires_context(&self.subtype) || self.question_type.is_context_bearing()
    }

    /// 子类型是猜测出来的，需要作者确认
    pub fn needs_confirmation(&self) -> bool {
        self.subtype_source == SubtypeSource::Sniffed
    }

    /// 保存时需要写回说明里的子类型
    pub fn embedded_subtype(&self) -> Option<&str> {
        if self.subtype_source.is_persisted() {
            Some(&self.subtype)
        } else {
            None
        }
    }

    pub fn member(&self, question_id: &RecordId) -> Option<&QuestionRecord> {
        self.members.iter().find(|q| &q.id == question_id)
    }

    pub fn member_mut(&mut self, question_id: &RecordId) -> Option<&mut QuestionRecord> {
        self.members.iter_mut().find(|q| &q.id == question_id)
    }
}
