use crate::models::question::{QuestionRecord, QuestionType};
use crate::models::reference::{Audio, Passage};
use crate::services::reference_resolver::resolve_ordinal;
use crate::services::tag_parser::{self, ParsedTag};

/// 题组分组键
///
/// 用结构体而不是拼接字符串，字段内容里出现任何分隔符都不会冲突
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub question_type: QuestionType,
    /// 标记中的子类型，没有标记时等于题型名称
    pub subtype: String,
    pub passage_ordinal: Option<usize>,
    pub audio_ordinal: Option<usize>,
    /// 去掉标记后的说明
    pub instructions: String,
    pub context: String,
}

impl GroupKey {
    /// 用已经解析好的标记构建分组键
    pub fn from_parts(
        record: &QuestionRecord,
        parsed: &ParsedTag,
        passages: &[Passage],
        audio: &[Audio],
    ) -> Self {
        Self {
            question_type: record.question_type.clone(),
            subtype: parsed
                .subtype
                .clone()
                .unwrap_or_else(|| record.question_type.as_str().to_string()),
            passage_ordinal: resolve_ordinal(record.passage_ref, passages),
            audio_ordinal: resolve_ordinal(record.audio_ref, audio),
            instructions: parsed.stripped_text.clone(),
            context: record.context.clone(),
        }
    }
}

/// 计算题目的分组键
pub fn build_key(record: &QuestionRecord, passages: &[Passage], audio: &[Audio]) -> GroupKey {
    let parsed = tag_parser::parse(&record.set_instructions);
    GroupKey::from_parts(record, &parsed, passages, audio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_fields_share_a_key() {
        let passages = vec![Passage::new(5, "Bees")];
        let a = QuestionRecord::new(1, QuestionType::Mcq)
            .with_instructions("[SUBTYPE:MCQ] Choose")
            .with_passage(5);
        let b = QuestionRecord::new(2, QuestionType::Mcq)
            .with_instructions("[SUBTYPE:MCQ] Choose")
            .with_passage(5)
            .with_text("different prompt");
        assert_eq!(build_key(&a, &passages, &[]), build_key(&b, &passages, &[]));
    }

    #[test]
    fn test_missing_tag_falls_back_to_type() {
        let record = QuestionRecord::new(1, QuestionType::ShortAnswer).with_instructions("Answer");
        let key = build_key(&record, &[], &[]);
        assert_eq!(key.subtype, "SHORT_ANSWER");
        assert_eq!(key.passage_ordinal, None);
    }

    #[test]
    fn test_swapped_passage_and_audio_do_not_collide() {
        let passages = vec![Passage::new(1, "P1"), Passage::new(2, "P2")];
        let audio = vec![Audio::new(1, "A1"), Audio::new(2, "A2")];
        let a = QuestionRecord::new(1, QuestionType::Mcq).with_passage(1).with_audio(2);
        let b = QuestionRecord::new(2, QuestionType::Mcq).with_passage(2).with_audio(1);
        assert_ne!(build_key(&a, &passages, &audio), build_key(&b, &passages, &audio));
    }

    #[test]
    fn test_separator_characters_in_fields_do_not_collide() {
        let a = QuestionRecord::new(1, QuestionType::Mcq)
            .with_instructions("a|b")
            .with_context("c");
        let b = QuestionRecord::new(2, QuestionType::Mcq)
            .with_instructions("a")
            .with_context("b|c");
        assert_ne!(build_key(&a, &[], &[]), build_key(&b, &[], &[]));
    }
}
