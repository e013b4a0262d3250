//! 作答会话
//!
//! 持有下发的试卷、答题卡和交卷状态。手动交卷与到时自动交卷互斥，先到者生效。

use crate::clients::TestApi;
use crate::config::Config;
use crate::error::SessionError;
use crate::models::answer_sheet::AnswerSheet;
use crate::models::question::{QuestionRecord, RecordId};
use crate::models::reference::Audio;
use crate::models::test_bundle::{Response, SubmitReceipt, TestDetail, TestMetadata};
use crate::services::recording_resolver::{group_by_recording, RecordingBucket, RecordingPolicy};
use crate::services::render_grouping::{dedup_by_identity, plan_render, render_table, RenderGroup, TableView};
use crate::workflow::countdown::Countdown;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// 交卷原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReason {
    Manual,
    Timeout,
}

/// 作答会话
#[derive(Debug)]
pub struct ExamSession {
    test_id: i64,
    test: TestMetadata,
    questions: Vec<QuestionRecord>,
    audio: Vec<Audio>,
    policy: RecordingPolicy,
    answers: Mutex<AnswerSheet>,
    submitted: AtomicBool,
    countdown: Mutex<Option<Countdown>>,
}

impl ExamSession {
    /// 创建会话，重复下发的题目只保留第一次出现
    pub fn new(test_id: i64, detail: TestDetail, policy: RecordingPolicy) -> Self {
        let questions = dedup_by_identity(&detail.questions);
        if questions.len() != detail.questions.len() {
            warn!(
                "⚠️ 试卷 {} 下发了 {} 道重复题目，已去重",
                test_id,
                detail.questions.len() - questions.len()
            );
        }
        Self {
            test_id,
            test: detail.test,
            questions,
            audio: detail.audio,
            policy,
            answers: Mutex::new(AnswerSheet::new()),
            submitted: AtomicBool::new(false),
            countdown: Mutex::new(None),
        }
    }

    /// 从后端获取试卷并创建会话
    pub async fn load<A: TestApi>(api: &A, test_id: i64, policy: RecordingPolicy) -> Result<Self> {
        let detail = api.get_test_detail(test_id).await?;
        info!("📝 已下发试卷 {}: {} 道题", test_id, detail.questions.len());
        Ok(Self::new(test_id, detail, policy))
    }

    pub fn test_id(&self) -> i64 {
        self.test_id
    }

    pub fn test(&self) -> &TestMetadata {
        &self.test
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    /// 渲染分组
    pub fn plan(&self) -> Vec<RenderGroup> {
        plan_render(&self.questions)
    }

    /// 听力录音分段
    pub fn recordings(&self) -> Vec<RecordingBucket> {
        group_by_recording(&self.questions, &self.audio, &self.policy)
    }

    /// 表格题的渲染方式
    pub fn table_view(&self, question: &QuestionRecord) -> TableView {
        render_table(question, &self.questions)
    }

    fn sheet(&self) -> MutexGuard<'_, AnswerSheet> {
        self.answers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.load(Ordering::SeqCst)
    }

    /// 记录答案，返回旧值
    pub fn record_answer(
        &self,
        question_id: &RecordId,
        text: impl Into<String>,
    ) -> Result<Option<String>, SessionError> {
        if self.is_submitted() {
            warn!("⚠️ 试卷 {} 已提交，忽略题目 {} 的作答", self.test_id, question_id);
            return Err(SessionError::AlreadySubmitted);
        }
        if !self.questions.iter().any(|q| &q.id == question_id) {
            return Err(SessionError::QuestionNotInTest {
                test_id: self.test_id,
                question_id: question_id.to_string(),
            });
        }
        Ok(self.sheet().write(question_id, text))
    }

    pub fn answer(&self, question_id: &RecordId) -> Option<String> {
        self.sheet().read(question_id).map(str::to_string)
    }

    /// 当前答题卡的快照，用于渲染模板
    pub fn answer_sheet(&self) -> AnswerSheet {
        self.sheet().clone()
    }

    pub fn responses(&self) -> Vec<Response> {
        self.sheet().responses()
    }

    /// 交卷
    ///
    /// 只有第一次调用会提交，之后返回 `Ok(None)`。提交失败时恢复未提交状态，可以重试。
    pub async fn submit<A>(&self, api: &A, reason: SubmitReason) -> Result<Option<SubmitReceipt>>
    where
        A: TestApi + Sync,
    {
        if self
            .submitted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("试卷 {} 已提交，跳过 {:?} 交卷", self.test_id, reason);
            return Ok(None);
        }

        // 自动交卷就在倒计时任务里执行，不能中止自己
        if reason == SubmitReason::Manual {
            self.cancel_countdown();
        }

        let responses = self.responses();
        info!(
            "📤 试卷 {} 交卷 ({:?}): {}/{} 道题已作答",
            self.test_id,
            reason,
            responses.len(),
            self.questions.len()
        );

        match api.submit_test(self.test_id, &responses).await {
            Ok(receipt) => {
                info!("✅ 试卷 {} 交卷成功，记录 {}", self.test_id, receipt.attempt_id);
                Ok(Some(receipt))
            }
            Err(e) => {
                self.submitted.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// 启动倒计时，到时自动交卷
    ///
    /// 倒计时只持有会话的弱引用，会话释放后不会再交卷。返回剩余时间的订阅。
    pub fn arm_auto_submit<A>(
        self: &Arc<Self>,
        api: Arc<A>,
        limit: Duration,
        tick: Duration,
    ) -> watch::Receiver<Duration>
    where
        A: TestApi + Send + Sync + 'static,
    {
        let session = Arc::downgrade(self);
        let countdown = Countdown::start(limit, tick, move || async move {
            let Some(session) = session.upgrade() else {
                return;
            };
            info!("⏰ 试卷 {} 作答时间到，自动交卷", session.test_id);
            if let Err(e) = session.submit(api.as_ref(), SubmitReason::Timeout).await {
                error!("❌ 试卷 {} 自动交卷失败: {:#}", session.test_id, e);
            }
        });

        let remaining = countdown.subscribe();
        let mut slot = self.countdown.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(countdown) {
            previous.cancel();
        }
        remaining
    }

    /// 按试卷的考试时长启动自动交卷，试卷没有时长时不启动
    pub fn arm_from_metadata<A>(
        self: &Arc<Self>,
        api: Arc<A>,
        config: &Config,
    ) -> Option<watch::Receiver<Duration>>
    where
        A: TestApi + Send + Sync + 'static,
    {
        let minutes = self.test.duration_minutes.filter(|m| *m > 0)?;
        let limit = Duration::from_secs(u64::from(minutes) * 60);
        info!("⏱️ 试卷 {} 限时 {} 分钟", self.test_id, minutes);
        Some(self.arm_auto_submit(api, limit, config.exam_tick()))
    }

    /// 剩余作答时间，没有倒计时时为 None
    pub fn remaining(&self) -> Option<Duration> {
        self.countdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Countdown::remaining)
    }

    fn cancel_countdown(&self) {
        if let Some(countdown) = self
            .countdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            countdown.cancel();
        }
    }
}
