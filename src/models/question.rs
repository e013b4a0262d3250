use serde::{Deserialize, Serialize};
use std::fmt;

/// 题目标识
///
/// 后端保存后为整数 ID，保存前为前端生成的临时字符串 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// 已持久化的 ID
    Persisted(i64),
    /// 未保存的临时 ID
    Transient(String),
}

impl RecordId {
    pub fn is_persisted(&self) -> bool {
        matches!(self, RecordId::Persisted(_))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Persisted(id) => write!(f, "{}", id),
            RecordId::Transient(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Persisted(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Transient(id.to_string())
    }
}

/// 题型
///
/// 未识别的题型名称保存在 `Other` 中，序列化时原样写回
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    Mcq,
    Matching,
    FillInTheBlank,
    TrueFalseNotGiven,
    YesNoNotGiven,
    ShortAnswer,
    Essay,
    SpeakingTask,
    WritingTask1Academic,
    WritingTask1General,
    WritingTask2,
    SpeakingPart1,
    SpeakingPart2,
    SpeakingPart3,
    TableCompletion,
    NoteCompletion,
    FormFilling,
    SentenceCompletion,
    SummaryCompletion,
    MapLabelling,
    Other(String),
}

static QUESTION_TYPES: phf::Map<&'static str, QuestionType> = phf::phf_map! {
    "MCQ" => QuestionType::Mcq,
    "MATCHING" => QuestionType::Matching,
    "FILL_IN_THE_BLANK" => QuestionType::FillInTheBlank,
    "TRUE_FALSE_NOT_GIVEN" => QuestionType::TrueFalseNotGiven,
    "YES_NO_NOT_GIVEN" => QuestionType::YesNoNotGiven,
    "SHORT_ANSWER" => QuestionType::ShortAnswer,
    "ESSAY" => QuestionType::Essay,
    "SPEAKING_TASK" => QuestionType::SpeakingTask,
    "WRITING_TASK1_ACADEMIC" => QuestionType::WritingTask1Academic,
    "WRITING_TASK1_GENERAL" => QuestionType::WritingTask1General,
    "WRITING_TASK2" => QuestionType::WritingTask2,
    "SPEAKING_PART1" => QuestionType::SpeakingPart1,
    "SPEAKING_PART2" => QuestionType::SpeakingPart2,
    "SPEAKING_PART3" => QuestionType::SpeakingPart3,
    "TABLE_COMPLETION" => QuestionType::TableCompletion,
    "NOTE_COMPLETION" => QuestionType::NoteCompletion,
    "FORM_FILLING" => QuestionType::FormFilling,
    "SENTENCE_COMPLETION" => QuestionType::SentenceCompletion,
    "SUMMARY_COMPLETION" => QuestionType::SummaryCompletion,
    "MAP_LABELLING" => QuestionType::MapLabelling,
};

impl QuestionType {
    /// 获取题型的标准名称
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::Mcq => "MCQ",
            QuestionType::Matching => "MATCHING",
            QuestionType::FillInTheBlank => "FILL_IN_THE_BLANK",
            QuestionType::TrueFalseNotGiven => "TRUE_FALSE_NOT_GIVEN",
            QuestionType::YesNoNotGiven => "YES_NO_NOT_GIVEN",
            QuestionType::ShortAnswer => "SHORT_ANSWER",
            QuestionType::Essay => "ESSAY",
            QuestionType::SpeakingTask => "SPEAKING_TASK",
            QuestionType::WritingTask1Academic => "WRITING_TASK1_ACADEMIC",
            QuestionType::WritingTask1General => "WRITING_TASK1_GENERAL",
            QuestionType::WritingTask2 => "WRITING_TASK2",
            QuestionType::SpeakingPart1 => "SPEAKING_PART1",
            QuestionType::SpeakingPart2 => "SPEAKING_PART2",
            QuestionType::SpeakingPart3 => "SPEAKING_PART3",
            QuestionType::TableCompletion => "TABLE_COMPLETION",
            QuestionType::NoteCompletion => "NOTE_COMPLETION",
            QuestionType::FormFilling => "FORM_FILLING",
            QuestionType::SentenceCompletion => "SENTENCE_COMPLETION",
            QuestionType::SummaryCompletion => "SUMMARY_COMPLETION",
            QuestionType::MapLabelling => "MAP_LABELLING",
            QuestionType::Other(name) => name,
        }
    }

    /// 从名称解析题型（未知名称保留为 `Other`）
    pub fn parse(name: &str) -> Self {
        QUESTION_TYPES
            .get(name)
            .cloned()
            .unwrap_or_else(|| QuestionType::Other(name.to_string()))
    }

    /// 作答时共用一个上下文模板的题型
    ///
    /// TABLE_COMPLETION 不在其中，表格题走独立的表格渲染
    pub fn is_context_bearing(&self) -> bool {
        matches!(
            self,
            QuestionType::NoteCompletion
                | QuestionType::FillInTheBlank
                | QuestionType::FormFilling
                | QuestionType::SentenceCompletion
                | QuestionType::SummaryCompletion
                | QuestionType::MapLabelling
        )
    }
}

impl From<String> for QuestionType {
    fn from(name: String) -> Self {
        QuestionType::parse(&name)
    }
}

impl From<QuestionType> for String {
    fn from(question_type: QuestionType) -> Self {
        question_type.as_str().to_string()
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 题目记录（后端存储的扁平结构，唯一的数据源）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub correct_answer: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_answers: Option<String>,
    /// 题号，同时也是占位符 `___N___` 的寻址键
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_in_test: Option<u32>,
    #[serde(default)]
    pub set_instructions: String,
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage_ref: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<i64>,
}

impl QuestionRecord {
    /// 创建一道空白题目
    pub fn new(id: impl Into<RecordId>, question_type: QuestionType) -> Self {
        Self {
            id: id.into(),
            question_type,
            text: String::new(),
            options: Vec::new(),
            correct_answer: serde_json::Value::Null,
            explanation: None,
            alternative_answers: None,
            order_in_test: None,
            set_instructions: String::new(),
            context: String::new(),
            passage_ref: None,
            audio_ref: None,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order_in_test = Some(order);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.set_instructions = instructions.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_passage(mut self, passage_id: i64) -> Self {
        self.passage_ref = Some(passage_id);
        self
    }

    pub fn with_audio(mut self, audio_id: i64) -> Self {
        self.audio_ref = Some(audio_id);
        self
    }

    pub fn has_context(&self) -> bool {
        !self.context.trim().is_empty()
    }
}
