use crate::models::question::RecordId;
use crate::models::test_bundle::Response;
use std::collections::HashMap;

/// 答题卡
///
/// 以题目标识为键，占位符只是指向题目的入口，从不作为键
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerSheet {
    answers: HashMap<RecordId, String>,
    /// 首次作答的顺序，用于稳定输出
    order: Vec<RecordId>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入答案，返回旧值
    pub fn write(&mut self, question_id: &RecordId, text: impl Into<String>) -> Option<String> {
        let previous = self.answers.insert(question_id.clone(), text.into());
        if previous.is_none() {
            self.order.push(question_id.clone());
        }
        previous
    }

    pub fn read(&self, question_id: &RecordId) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    pub fn clear(&mut self, question_id: &RecordId) -> Option<String> {
        let removed = self.answers.remove(question_id);
        if removed.is_some() {
            self.order.retain(|id| id != question_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// 生成交卷用的作答列表
    pub fn responses(&self) -> Vec<Response> {
        self.order
            .iter()
            .filter_map(|id| {
                self.answers.get(id).map(|text| Response {
                    question_id: id.clone(),
                    response_text: text.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_overwrites_and_keeps_first_order() {
        let mut sheet = AnswerSheet::new();
        let a = RecordId::Persisted(1);
        let b = RecordId::Transient("tmp-2".into());

        assert_eq!(sheet.write(&b, "river"), None);
        assert_eq!(sheet.write(&a, "Smith"), None);
        assert_eq!(sheet.write(&b, "bridge"), Some("river".to_string()));

        let responses = sheet.responses();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].question_id, b);
        assert_eq!(responses[0].response_text, "bridge");
        assert_eq!(responses[1].question_id, a);
    }

    #[test]
    fn test_clear_removes_from_responses() {
        let mut sheet = AnswerSheet::new();
        let a = RecordId::Persisted(1);
        sheet.write(&a, "x");
        assert_eq!(sheet.clear(&a), Some("x".to_string()));
        assert!(sheet.is_empty());
        assert!(sheet.responses().is_empty());
    }
}
