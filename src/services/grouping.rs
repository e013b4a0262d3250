//! 分组引擎
//!
//! 把后端的扁平题目列表聚合为有序的题组列表：
//! 1. 按原始顺序遍历题目，计算分组键
//! 2. 新键创建题组，用第一道题确定子类型、说明、上下文和文章/音频序号
//! 3. 题目按出现顺序追加到所属题组
//! 4. 最后生成显示名称，同一子类型出现多次时全部加数字后缀

use crate::models::question::{QuestionRecord, QuestionType};
use crate::models::question_set::QuestionSet;
use crate::models::reference::{Audio, Passage};
use crate::models::subtype::{self, SubtypeSource};
use crate::services::key_builder::GroupKey;
use crate::services::tag_parser;
use std::collections::HashMap;
use tracing::{debug, info};

/// 将扁平题目列表聚合为题组
pub fn group_records(
    records: &[QuestionRecord],
    passages: &[Passage],
    audio: &[Audio],
) -> Vec<QuestionSet> {
    let mut sets: Vec<QuestionSet> = Vec::new();
    let mut index_by_key: HashMap<GroupKey, usize> = HashMap::new();

    for record in records {
        let parsed = tag_parser::parse(&record.set_instructions);
        let key = GroupKey::from_parts(record, &parsed, passages, audio);

        let set_index = match index_by_key.get(&key) {
            Some(&index) => index,
            None => {
                let (subtype, source) =
                    derive_subtype(&record.question_type, parsed.subtype, &record.context);
                if source == SubtypeSource::Sniffed {
                    info!(
                        "🔎 题目 {} 没有子类型标记，根据上下文推断为 {}，需要作者确认",
                        record.id, subtype
                    );
                }

                let mut set = QuestionSet::new(
                    format!("set-{}", sets.len() + 1),
                    record.question_type.clone(),
                );
                set.subtype = subtype;
                set.subtype_source = source;
                set.instructions = key.instructions.clone();
                set.context = key.context.clone();
                set.passage_ordinal = key.passage_ordinal;
                set.audio_ordinal = key.audio_ordinal;

                sets.push(set);
                index_by_key.insert(key, sets.len() - 1);
                sets.len() - 1
            }
        };

        sets[set_index].members.push(record.clone());
    }

    assign_display_names(&mut sets);

    debug!("{} 道题目聚合为 {} 个题组", records.len(), sets.len());
    sets
}

/// 确定题组子类型
///
/// 标记优先；FILL_IN_THE_BLANK 有上下文但没有标记时根据内容猜测；否则沿用题型
pub fn derive_subtype(
    question_type: &QuestionType,
    tagged: Option<String>,
    context: &str,
) -> (String, SubtypeSource) {
    if let Some(subtype) = tagged {
        return (subtype, SubtypeSource::Tagged);
    }
    if *question_type == QuestionType::FillInTheBlank && !context.trim().is_empty() {
        return (
            subtype::sniff_subtype(context).to_string(),
            SubtypeSource::Sniffed,
        );
    }
    (question_type.as_str().to_string(), SubtypeSource::Inherited)
}

/// 生成题组显示名称
///
/// 同一子类型出现多次时，每一个（包括第一个）都加上从 1 开始的序号
pub fn assign_display_names(sets: &mut [QuestionSet]) {
    let mut totals: HashMap<String, usize> = HashMap::new();
    for set in sets.iter() {
        *totals.entry(set.subtype.clone()).or_default() += 1;
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    for set in sets.iter_mut() {
        let label = subtype::display_label(&set.subtype, &set.question_type);
        set.name = if totals.get(&set.subtype).copied().unwrap_or(0) > 1 {
            let n = seen.entry(set.subtype.clone()).or_default();
            *n += 1;
            format!("{} {}", label, n)
        } else {
            label
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::RecordId;
    use crate::models::subtype::{FLEXIBLE_CONTEXT, NOTE_COMPLETION, TABLE_COMPLETION};

    fn fill(id: i64, order: u32, instructions: &str, context: &str) -> QuestionRecord {
        QuestionRecord::new(id, QuestionType::FillInTheBlank)
            .with_order(order)
            .with_instructions(instructions)
            .with_context(context)
    }

    #[test]
    fn test_records_with_same_key_share_a_set() {
        let records = vec![
            fill(1, 1, "[SUBTYPE:NOTE_COMPLETION] Complete the notes", "Notes: ___1___ ___2___"),
            fill(2, 2, "[SUBTYPE:NOTE_COMPLETION] Complete the notes", "Notes: ___1___ ___2___"),
            QuestionRecord::new(3, QuestionType::Mcq).with_order(3).with_instructions("Choose"),
        ];

        let sets = group_records(&records, &[], &[]);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].members.len(), 2);
        assert_eq!(sets[0].subtype, NOTE_COMPLETION);
        assert_eq!(sets[0].subtype_source, SubtypeSource::Tagged);
        assert_eq!(sets[0].instructions, "Complete the notes");
        assert_eq!(sets[0].name, "Note Completion");
        assert_eq!(sets[1].name, "Multiple Choice Questions");
        assert_eq!(sets[1].subtype_source, SubtypeSource::Inherited);
    }

    #[test]
    fn test_sets_are_emitted_in_first_seen_order() {
        let records = vec![
            QuestionRecord::new(1, QuestionType::Mcq).with_instructions("A"),
            QuestionRecord::new(2, QuestionType::Matching).with_instructions("B"),
            QuestionRecord::new(3, QuestionType::Mcq).with_instructions("A"),
        ];
        let sets = group_records(&records, &[], &[]);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].question_type, QuestionType::Mcq);
        let ids: Vec<&RecordId> = sets[0].members.iter().map(|q| &q.id).collect();
        assert_eq!(ids, vec![&RecordId::Persisted(1), &RecordId::Persisted(3)]);
    }

    #[test]
    fn test_duplicate_subtypes_are_all_numbered() {
        let records = vec![
            fill(1, 1, "Complete table A", "|Day|Time|\n|Mon|___1___|"),
            fill(2, 2, "Complete table B", "|City|Country|\n|___2___|France|"),
        ];
        let sets = group_records(&records, &[], &[]);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].subtype, TABLE_COMPLETION);
        assert_eq!(sets[0].name, "Table Completion 1");
        assert_eq!(sets[1].name, "Table Completion 2");
    }

    #[test]
    fn test_untagged_fill_in_the_blank_is_sniffed() {
        let records = vec![fill(1, 1, "Answer", "The river flows ___1___")];
        let sets = group_records(&records, &[], &[]);
        assert_eq!(sets[0].subtype, FLEXIBLE_CONTEXT);
        assert!(sets[0].needs_confirmation());
        assert_eq!(sets[0].name, "Flexible Context");
    }

    #[test]
    fn test_fill_in_the_blank_without_context_keeps_type() {
        let records = vec![fill(1, 1, "Answer", "   ")];
        let sets = group_records(&records, &[], &[]);
        assert_eq!(sets[0].subtype, "FILL_IN_THE_BLANK");
        assert_eq!(sets[0].subtype_source, SubtypeSource::Inherited);
    }

    #[test]
    fn test_ordinals_are_resolved_from_foreign_keys() {
        let passages = vec![Passage::new(100, "P1"), Passage::new(200, "P2")];
        let audio = vec![Audio::new(7, "A1")];
        let records = vec![
            QuestionRecord::new(1, QuestionType::Mcq).with_passage(200),
            QuestionRecord::new(2, QuestionType::Mcq).with_passage(999).with_audio(7),
        ];
        let sets = group_records(&records, &passages, &audio);
        assert_eq!(sets[0].passage_ordinal, Some(2));
        assert_eq!(sets[1].passage_ordinal, None);
        assert_eq!(sets[1].audio_ordinal, Some(1));
    }
}
