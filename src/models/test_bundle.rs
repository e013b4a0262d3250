//! 与外部协作方交换的数据结构
//!
//! 字段名与后端保持一致（camelCase）

use crate::models::question::{QuestionRecord, RecordId};
use crate::models::reference::{Audio, Passage};
use serde::{Deserialize, Serialize};

/// 试卷元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_type: Option<String>,
    /// 考试时长（分钟）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

/// 编辑用的试卷数据（getTestForEdit 的返回）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestForEdit {
    #[serde(alias = "testMetadata")]
    pub test: TestMetadata,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
    #[serde(default)]
    pub passages: Vec<Passage>,
    #[serde(default)]
    pub audio: Vec<Audio>,
    /// 来源文件路径（不参与序列化）
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl TestForEdit {
    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }
}

/// 保存试卷时提交的数据（createTest / updateTest）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPayload {
    pub test: TestMetadata,
    pub questions: Vec<QuestionRecord>,
}

/// 保存结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTest {
    pub id: i64,
}

/// 作答用的试卷数据（getTestDetail 的返回）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDetail {
    pub test: TestMetadata,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
    #[serde(default)]
    pub audio: Vec<Audio>,
}

/// 单题作答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub question_id: RecordId,
    pub response_text: String,
}

/// 交卷结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub attempt_id: i64,
}
