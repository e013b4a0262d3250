//! 听力录音分段
//!
//! 有音频引用的题目按引用归入对应录音；没有引用的按题号区间推断，
//! 默认每段录音 10 道题。

use crate::config::Config;
use crate::models::question::QuestionRecord;
use crate::models::reference::{Audio, Referenced};
use crate::services::reference_resolver::to_ordinal;
use crate::services::render_grouping::dedup_by_identity;

/// 录音分段规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingPolicy {
    /// 每段录音覆盖的题号数
    pub questions_per_recording: u32,
    /// 没有音频列表时的录音段数上限
    pub max_recordings: usize,
}

impl Default for RecordingPolicy {
    fn default() -> Self {
        Self {
            questions_per_recording: 10,
            max_recordings: 4,
        }
    }
}

impl RecordingPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            questions_per_recording: config.questions_per_recording,
            max_recordings: config.max_recordings,
        }
    }

    /// 录音序号上限：有音频列表时为列表长度，列表为空时用段数上限
    fn upper_bound(&self, audio: &[Audio]) -> usize {
        let upper = if audio.is_empty() {
            self.max_recordings
        } else {
            audio.len()
        };
        upper.max(1)
    }
}

/// 一段录音及其题目
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingBucket {
    /// 录音序号（从 1 开始）
    pub recording: usize,
    pub audio_id: Option<i64>,
    pub questions: Vec<QuestionRecord>,
}

/// 计算题目所属录音序号（从 1 开始）
pub fn resolve_recording(question: &QuestionRecord, audio: &[Audio], policy: &RecordingPolicy) -> usize {
    let explicit = question.audio_ref.and_then(|key| to_ordinal(key, audio));
    let recording = explicit.unwrap_or_else(|| positional_recording(question, policy));
    recording.clamp(1, policy.upper_bound(audio))
}

fn positional_recording(question: &QuestionRecord, policy: &RecordingPolicy) -> usize {
    let order = question.order_in_test.unwrap_or(1).max(1);
    let per = policy.questions_per_recording.max(1);
    ((order - 1) / per + 1) as usize
}

/// 按录音分段，只返回非空分段，按录音序号排列
pub fn group_by_recording(
    records: &[QuestionRecord],
    audio: &[Audio],
    policy: &RecordingPolicy,
) -> Vec<RecordingBucket> {
    let mut buckets: Vec<RecordingBucket> = (1..=policy.upper_bound(audio))
        .map(|recording| RecordingBucket {
            recording,
            audio_id: audio.get(recording - 1).map(Referenced::ref_id),
            questions: Vec::new(),
        })
        .collect();

    for record in dedup_by_identity(records) {
        let recording = resolve_recording(&record, audio, policy);
        buckets[recording - 1].questions.push(record);
    }

    buckets.retain(|b| !b.questions.is_empty());
    buckets
}
