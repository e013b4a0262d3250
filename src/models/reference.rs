use serde::{Deserialize, Serialize};

/// 可被题目引用的实体（阅读文章、听力音频）
pub trait Referenced {
    /// 后端持久化的 ID
    fn ref_id(&self) -> i64;
}

/// 阅读文章
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
}

impl Passage {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: String::new(),
        }
    }
}

impl Referenced for Passage {
    fn ref_id(&self) -> i64 {
        self.id
    }
}

/// 听力音频
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audio {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Audio {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            url: None,
        }
    }
}

impl Referenced for Audio {
    fn ref_id(&self) -> i64 {
        self.id
    }
}
