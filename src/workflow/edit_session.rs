//! 编辑会话
//!
//! 持有题组、文章和音频列表。扁平题目列表不单独保存，每次读取都从题组重新生成，
//! 所以任何修改之后读到的都是最新数据。

use crate::clients::TestApi;
use crate::error::{SessionError, TemplateError};
use crate::models::question::{QuestionRecord, QuestionType, RecordId};
use crate::models::question_set::QuestionSet;
use crate::models::reference::{Audio, Passage};
use crate::models::subtype::SubtypeSource;
use crate::models::test_bundle::{TestForEdit, TestMetadata, TestPayload};
use crate::services::grouping::{assign_display_names, group_records};
use crate::services::reference_resolver::remap_ordinal;
use crate::services::synchronizer::flatten_sets;
use crate::services::tag_parser;
use crate::services::template::{self, RenderedTemplate};
use anyhow::Result;
use tracing::{debug, info};

/// 模板检查发现的问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateIssue {
    pub set_id: String,
    pub error: TemplateError,
}

/// 已有 `tmp-N` 的最大序号加一
fn next_transient_seq(records: &[QuestionRecord]) -> usize {
    records
        .iter()
        .filter_map(|q| match &q.id {
            RecordId::Transient(id) => id.strip_prefix("tmp-")?.parse::<usize>().ok(),
            RecordId::Persisted(_) => None,
        })
        .max()
        .map_or(1, |max| max + 1)
}

/// 编辑会话
#[derive(Debug, Clone)]
pub struct EditSession {
    test_id: Option<i64>,
    metadata: TestMetadata,
    sets: Vec<QuestionSet>,
    passages: Vec<Passage>,
    audio: Vec<Audio>,
    next_set_seq: usize,
    next_question_seq: usize,
}

impl EditSession {
    /// 创建空白试卷
    pub fn new(metadata: TestMetadata) -> Self {
        Self {
            test_id: metadata.id,
            metadata,
            sets: Vec::new(),
            passages: Vec::new(),
            audio: Vec::new(),
            next_set_seq: 1,
            next_question_seq: 1,
        }
    }

    /// 从后端数据创建会话，加载时完成分组
    pub fn from_bundle(bundle: TestForEdit) -> Self {
        let sets = group_records(&bundle.questions, &bundle.passages, &bundle.audio);
        info!(
            "📖 已加载试卷 {}: {} 道题 → {} 个题组",
            bundle.test.title,
            bundle.questions.len(),
            sets.len()
        );
        Self {
            test_id: bundle.test.id,
            next_set_seq: sets.len() + 1,
            next_question_seq: next_transient_seq(&bundle.questions),
            metadata: bundle.test,
            sets,
            passages: bundle.passages,
            audio: bundle.audio,
        }
    }

    /// 从后端加载
    pub async fn load<A: TestApi>(api: &A, test_id: i64) -> Result<Self> {
        let mut bundle = api.get_test_for_edit(test_id).await?;
        bundle.test.id = Some(test_id);
        Ok(Self::from_bundle(bundle))
    }

    pub fn test_id(&self) -> Option<i64> {
        self.test_id
    }

    pub fn metadata(&self) -> &TestMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut TestMetadata {
        &mut self.metadata
    }

    pub fn sets(&self) -> &[QuestionSet] {
        &self.sets
    }

    pub fn set(&self, set_id: &str) -> Option<&QuestionSet> {
        self.sets.iter().find(|s| s.id == set_id)
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn audio(&self) -> &[Audio] {
        &self.audio
    }

    /// 当前的扁平题目列表（每次从题组重新生成）
    pub fn records(&self) -> Vec<QuestionRecord> {
        flatten_sets(&self.sets, &self.passages, &self.audio)
    }

    /// 保存用的数据
    pub fn payload(&self) -> TestPayload {
        TestPayload {
            test: self.metadata.clone(),
            questions: self.records(),
        }
    }

    fn set_mut(&mut self, set_id: &str) -> Result<&mut QuestionSet, SessionError> {
        self.sets
            .iter_mut()
            .find(|s| s.id == set_id)
            .ok_or_else(|| SessionError::SetNotFound {
                set_id: set_id.to_string(),
            })
    }

    fn next_transient_id(&mut self) -> RecordId {
        let id = RecordId::Transient(format!("tmp-{}", self.next_question_seq));
        self.next_question_seq += 1;
        id
    }

    /// 下一个未使用的题号
    fn next_order(&self) -> u32 {
        self.sets
            .iter()
            .flat_map(|s| s.members.iter())
            .filter_map(|q| q.order_in_test)
            .max()
            .unwrap_or(0)
            + 1
    }

    // ========== 题组操作 ==========

    /// 新增题组（附带一道空白题目），返回题组 ID
    pub fn add_set(&mut self, question_type: QuestionType) -> String {
        let set_id = format!("set-{}", self.next_set_seq);
        self.next_set_seq += 1;

        let mut set = QuestionSet::new(set_id.clone(), question_type.clone());
        let order = self.next_order();
        let question_id = self.next_transient_id();
        set.members
            .push(QuestionRecord::new(question_id, question_type).with_order(order));

        self.sets.push(set);
        assign_display_names(&mut self.sets);
        debug!("新增题组 {}", set_id);
        set_id
    }

    /// 删除题组
    pub fn remove_set(&mut self, set_id: &str) -> Result<QuestionSet, SessionError> {
        let index = self
            .sets
            .iter()
            .position(|s| s.id == set_id)
            .ok_or_else(|| SessionError::SetNotFound {
                set_id: set_id.to_string(),
            })?;
        let removed = self.sets.remove(index);
        assign_display_names(&mut self.sets);
        Ok(removed)
    }

    /// 手动设置子类型
    pub fn set_subtype(&mut self, set_id: &str, subtype: &str) -> Result<(), SessionError> {
        let set = self.set_mut(set_id)?;
        set.subtype = subtype.to_string();
        set.subtype_source = SubtypeSource::Confirmed;
        assign_display_names(&mut self.sets);
        Ok(())
    }

    /// 确认推断出的子类型
    pub fn confirm_subtype(&mut self, set_id: &str) -> Result<(), SessionError> {
        let set = self.set_mut(set_id)?;
        if set.subtype_source != SubtypeSource::Inherited {
            set.subtype_source = SubtypeSource::Confirmed;
        }
        Ok(())
    }

    /// 修改说明，说明中若带有子类型标记则作为子类型
    pub fn set_instructions(&mut self, set_id: &str, text: &str) -> Result<(), SessionError> {
        let parsed = tag_parser::parse(text);
        let set = self.set_mut(set_id)?;
        set.instructions = parsed.stripped_text;
        if let Some(subtype) = parsed.subtype {
            set.subtype = subtype;
            set.subtype_source = SubtypeSource::Tagged;
            assign_display_names(&mut self.sets);
        }
        Ok(())
    }

    pub fn set_context(&mut self, set_id: &str, context: &str) -> Result<(), SessionError> {
        self.set_mut(set_id)?.context = context.to_string();
        Ok(())
    }

    /// 关联文章（按当前列表序号），None 表示取消关联
    pub fn set_passage(&mut self, set_id: &str, ordinal: Option<usize>) -> Result<(), SessionError> {
        check_ordinal("passage", ordinal, self.passages.len())?;
        self.set_mut(set_id)?.passage_ordinal = ordinal;
        Ok(())
    }

    /// 关联音频（按当前列表序号），None 表示取消关联
    pub fn set_audio(&mut self, set_id: &str, ordinal: Option<usize>) -> Result<(), SessionError> {
        check_ordinal("audio", ordinal, self.audio.len())?;
        self.set_mut(set_id)?.audio_ordinal = ordinal;
        Ok(())
    }

    // ========== 题目操作 ==========

    /// 在题组末尾新增一道题，返回临时 ID
    pub fn add_question(&mut self, set_id: &str) -> Result<RecordId, SessionError> {
        let order = self.next_order();
        let question_id = self.next_transient_id();
        let set = self.set_mut(set_id)?;
        let question =
            QuestionRecord::new(question_id.clone(), set.question_type.clone()).with_order(order);
        set.members.push(question);
        Ok(question_id)
    }

    pub fn remove_question(
        &mut self,
        set_id: &str,
        question_id: &RecordId,
    ) -> Result<QuestionRecord, SessionError> {
        let set = self.set_mut(set_id)?;
        let index = set
            .members
            .iter()
            .position(|q| &q.id == question_id)
            .ok_or_else(|| SessionError::QuestionNotFound {
                set_id: set_id.to_string(),
                question_id: question_id.to_string(),
            })?;
        Ok(set.members.remove(index))
    }

    /// 修改题目内容
    pub fn update_question<F>(
        &mut self,
        set_id: &str,
        question_id: &RecordId,
        edit: F,
    ) -> Result<(), SessionError>
    where
        F: FnOnce(&mut QuestionRecord),
    {
        let set = self.set_mut(set_id)?;
        let question =
            set.member_mut(question_id)
                .ok_or_else(|| SessionError::QuestionNotFound {
                    set_id: set_id.to_string(),
                    question_id: question_id.to_string(),
                })?;
        edit(question);
        Ok(())
    }

    // ========== 文章与音频 ==========

    /// 替换文章列表，所有题组的文章序号按外键重新计算
    pub fn replace_passages(&mut self, passages: Vec<Passage>) {
        for set in &mut self.sets {
            set.passage_ordinal = remap_ordinal(set.passage_ordinal, &self.passages, &passages);
        }
        self.passages = passages;
    }

    /// 替换音频列表，所有题组的音频序号按外键重新计算
    pub fn replace_audio(&mut self, audio: Vec<Audio>) {
        for set in &mut self.sets {
            set.audio_ordinal = remap_ordinal(set.audio_ordinal, &self.audio, &audio);
        }
        self.audio = audio;
    }

    // ========== 模板 ==========

    /// 解析题组的上下文模板，候选题目为整张试卷的题目
    pub fn template(&self, set_id: &str) -> Result<RenderedTemplate, SessionError> {
        let set = self.set(set_id).ok_or_else(|| SessionError::SetNotFound {
            set_id: set_id.to_string(),
        })?;
        Ok(template::parse_template(&set.context, &self.records()))
    }

    /// 检查所有需要模板的题组
    ///
    /// 只报告无法使用的模板；个别占位符找不到题目只记录日志
    pub fn validate_templates(&self) -> Vec<TemplateIssue> {
        let records = self.records();
        let mut issues = Vec::new();

        for set in &self.sets {
            let expects_template = set.requires_context() && !set.context.trim().is_empty();
            if !expects_template && !template::has_placeholders(&set.context) {
                continue;
            }

            let rendered = template::parse_template(&set.context, &records);
            let unresolved = rendered.unresolved();
            if !unresolved.is_empty() {
                tracing::warn!(
                    "⚠️ 题组 {} 的占位符 {:?} 找不到对应题目",
                    set.name,
                    unresolved
                );
            }
            if let Err(error) = rendered.validate(&set.name) {
                issues.push(TemplateIssue {
                    set_id: set.id.clone(),
                    error,
                });
            }
        }

        issues
    }

    // ========== 保存 ==========

    /// 保存到后端：没有试卷 ID 时创建，否则更新
    pub async fn save<A: TestApi>(&mut self, api: &A) -> Result<i64> {
        let payload = self.payload();
        let saved = match self.test_id {
            Some(test_id) => api.update_test(test_id, &payload).await?,
            None => api.create_test(&payload).await?,
        };
        self.test_id = Some(saved.id);
        self.metadata.id = Some(saved.id);
        info!("💾 试卷已保存: {} ({} 道题)", saved.id, payload.questions.len());
        Ok(saved.id)
    }
}

fn check_ordinal(list: &'static str, ordinal: Option<usize>, len: usize) -> Result<(), SessionError> {
    match ordinal {
        Some(o) if o == 0 || o > len => Err(SessionError::OrdinalOutOfRange {
            list,
            ordinal: o,
            len,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subtype::{FLEXIBLE_CONTEXT, NOTE_COMPLETION};

    fn bundle() -> TestForEdit {
        TestForEdit {
            test: TestMetadata {
                id: Some(9),
                title: "Listening".into(),
                ..TestMetadata::default()
            },
            questions: vec![
                QuestionRecord::new(1, QuestionType::FillInTheBlank)
                    .with_order(1)
                    .with_instructions("[SUBTYPE:NOTE_COMPLETION] Complete the notes")
                    .with_context("Notes: ___1___ ___2___")
                    .with_audio(20),
                QuestionRecord::new(2, QuestionType::FillInTheBlank)
                    .with_order(2)
                    .with_instructions("[SUBTYPE:NOTE_COMPLETION] Complete the notes")
                    .with_context("Notes: ___1___ ___2___")
                    .with_audio(20),
                QuestionRecord::new(3, QuestionType::Mcq).with_order(3),
            ],
            passages: vec![],
            audio: vec![Audio::new(10, "Section 1"), Audio::new(20, "Section 2")],
            file_path: None,
        }
    }

    #[test]
    fn test_edits_are_visible_immediately() {
        let mut session = EditSession::from_bundle(bundle());
        let set_id = session.sets()[0].id.clone();

        session
            .update_question(&set_id, &RecordId::Persisted(2), |q| q.text = "Street".into())
            .unwrap();
        session.set_instructions(&set_id, "Write ONE WORD").unwrap();

        let records = session.records();
        assert_eq!(records[1].text, "Street");
        assert_eq!(
            records[1].set_instructions,
            "[SUBTYPE:NOTE_COMPLETION] Write ONE WORD"
        );
    }

    #[test]
    fn test_add_and_remove_questions() {
        let mut session = EditSession::from_bundle(bundle());
        let set_id = session.sets()[1].id.clone();

        let new_id = session.add_question(&set_id).unwrap();
        assert_eq!(new_id, RecordId::Transient("tmp-1".into()));
        let records = session.records();
        assert_eq!(records.len(), 4);
        assert_eq!(records[3].order_in_test, Some(4));

        session.remove_question(&set_id, &RecordId::Persisted(3)).unwrap();
        assert_eq!(session.records().len(), 3);
        assert!(matches!(
            session.remove_question(&set_id, &RecordId::Persisted(3)),
            Err(SessionError::QuestionNotFound { .. })
        ));
    }

    #[test]
    fn test_transient_ids_continue_after_reload() {
        let mut data = bundle();
        data.questions.push(
            QuestionRecord::new("tmp-4", QuestionType::Mcq).with_order(4),
        );
        let mut session = EditSession::from_bundle(data);
        let set_id = session.sets()[1].id.clone();

        let first = session.add_question(&set_id).unwrap();
        let second = session.add_question(&set_id).unwrap();
        assert_eq!(first, RecordId::Transient("tmp-5".into()));
        assert_eq!(second, RecordId::Transient("tmp-6".into()));
        assert_eq!(session.records().len(), 6);
    }

    #[test]
    fn test_add_set_renumbers_duplicate_names() {
        let mut session = EditSession::new(TestMetadata::default());
        let a = session.add_set(QuestionType::Mcq);
        assert_eq!(session.set(&a).unwrap().name, "Multiple Choice Questions");
        let b = session.add_set(QuestionType::Mcq);
        assert_eq!(session.set(&a).unwrap().name, "Multiple Choice Questions 1");
        assert_eq!(session.set(&b).unwrap().name, "Multiple Choice Questions 2");

        session.remove_set(&a).unwrap();
        assert_eq!(session.set(&b).unwrap().name, "Multiple Choice Questions");
        assert!(session.remove_set(&a).is_err());
    }

    #[test]
    fn test_audio_reorder_keeps_association() {
        let mut session = EditSession::from_bundle(bundle());
        let set_id = session.sets()[0].id.clone();
        assert_eq!(session.set(&set_id).unwrap().audio_ordinal, Some(2));

        session.replace_audio(vec![
            Audio::new(20, "Section 2"),
            Audio::new(30, "Section 3"),
            Audio::new(10, "Section 1"),
        ]);
        assert_eq!(session.set(&set_id).unwrap().audio_ordinal, Some(1));
        assert_eq!(session.records()[0].audio_ref, Some(20));

        session.replace_audio(vec![Audio::new(10, "Section 1")]);
        assert_eq!(session.set(&set_id).unwrap().audio_ordinal, None);
        assert_eq!(session.records()[0].audio_ref, None);
    }

    #[test]
    fn test_ordinal_bounds_are_checked() {
        let mut session = EditSession::from_bundle(bundle());
        let set_id = session.sets()[1].id.clone();
        assert_eq!(
            session.set_audio(&set_id, Some(3)),
            Err(SessionError::OrdinalOutOfRange {
                list: "audio",
                ordinal: 3,
                len: 2
            })
        );
        assert!(session.set_audio(&set_id, Some(1)).is_ok());
        assert!(session.set_passage(&set_id, Some(1)).is_err());
        assert!(session.set_passage(&set_id, None).is_ok());
    }

    #[test]
    fn test_sniffed_subtype_is_persisted_only_after_confirmation() {
        let mut session = EditSession::new(TestMetadata::default());
        let set_id = session.add_set(QuestionType::FillInTheBlank);
        session.set_context(&set_id, "The river flows ___1___").unwrap();
        session.set_instructions(&set_id, "Complete").unwrap();
        assert_eq!(session.records()[0].set_instructions, "Complete");

        session.set_subtype(&set_id, FLEXIBLE_CONTEXT).unwrap();
        assert_eq!(
            session.records()[0].set_instructions,
            "[SUBTYPE:FLEXIBLE_CONTEXT] Complete"
        );
    }

    #[test]
    fn test_template_validation() {
        let mut session = EditSession::from_bundle(bundle());
        assert!(session.validate_templates().is_empty());

        let set_id = session.sets()[0].id.clone();
        session.set_context(&set_id, "Notes: ___7___ ___8___").unwrap();
        let issues = session.validate_templates();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].set_id, set_id);
        assert!(matches!(issues[0].error, TemplateError::NoneResolved { .. }));

        let template = session.template(&set_id).unwrap();
        assert_eq!(template.unresolved(), vec![7, 8]);
        assert_eq!(session.sets()[0].subtype, NOTE_COMPLETION);
    }
}
