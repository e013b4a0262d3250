//! 同步器：题组 → 扁平题目列表
//!
//! 分组引擎的逆过程。题组只存在于内存中，保存时总是从题组重新生成扁平列表。

use crate::models::question::QuestionRecord;
use crate::models::question_set::QuestionSet;
use crate::models::reference::{Audio, Passage};
use crate::services::reference_resolver::to_foreign_key;
use crate::services::tag_parser;

/// 题号缺失时的兜底值：题组序号 * 10 + 组内序号 + 1
pub fn fallback_order(set_index: usize, member_index: usize) -> u32 {
    (set_index * 10 + member_index + 1) as u32
}

/// 将题组展开为扁平题目列表
pub fn flatten_sets(
    sets: &[QuestionSet],
    passages: &[Passage],
    audio: &[Audio],
) -> Vec<QuestionRecord> {
    let mut records = Vec::with_capacity(sets.iter().map(|s| s.members.len()).sum());

    for (set_index, set) in sets.iter().enumerate() {
        let passage_ref = set.passage_ordinal.and_then(|o| to_foreign_key(o, passages));
        let audio_ref = set.audio_ordinal.and_then(|o| to_foreign_key(o, audio));
        let set_instructions = match set.embedded_subtype() {
            Some(subtype) => tag_parser::embed(subtype, &set.instructions),
            None => set.instructions.clone(),
        };

        for (member_index, member) in set.members.iter().enumerate() {
            records.push(QuestionRecord {
                id: member.id.clone(),
                question_type: set.question_type.clone(),
                text: member.text.clone(),
                options: member.options.clone(),
                correct_answer: member.correct_answer.clone(),
                explanation: member.explanation.clone(),
                alternative_answers: member.alternative_answers.clone(),
                order_in_test: Some(
                    member
                        .order_in_test
                        .unwrap_or_else(|| fallback_order(set_index, member_index)),
                ),
                set_instructions: set_instructions.clone(),
                context: if set.context.is_empty() {
                    member.context.clone()
                } else {
                    set.context.clone()
                },
                passage_ref,
                audio_ref,
            });
        }
    }

    records
}
