//! 本地文件实现的试卷后端
//!
//! 目录结构：
//! - `tests/<id>.json`：编辑用的试卷数据
//! - `attempts/<test_id>-<n>.json`：交卷记录

use crate::clients::TestApi;
use crate::error::FileError;
use crate::models::question::{QuestionRecord, RecordId};
use crate::models::test_bundle::{
    Response, SavedTest, SubmitReceipt, TestDetail, TestForEdit, TestPayload,
};
use anyhow::{Context, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// 文件试卷库
#[derive(Debug, Clone)]
pub struct FileTestStore {
    root: PathBuf,
}

impl FileTestStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn tests_dir(&self) -> PathBuf {
        self.root.join("tests")
    }

    fn attempts_dir(&self) -> PathBuf {
        self.root.join("attempts")
    }

    fn test_path(&self, test_id: i64) -> PathBuf {
        self.tests_dir().join(format!("{}.json", test_id))
    }

    /// 直接写入一份试卷（用于导入已有数据）
    pub async fn seed(&self, test_id: i64, bundle: &TestForEdit) -> Result<()> {
        let mut bundle = bundle.clone();
        bundle.test.id = Some(test_id);
        self.write_bundle(test_id, &bundle).await
    }

    async fn write_bundle(&self, test_id: i64, bundle: &TestForEdit) -> Result<()> {
        fs::create_dir_all(self.tests_dir()).await?;
        let path = self.test_path(test_id);
        let content = serde_json::to_string_pretty(bundle)?;
        fs::write(&path, content)
            .await
            .with_context(|| format!("无法写入试卷文件: {}", path.display()))?;
        Ok(())
    }

    async fn read_bundle(&self, test_id: i64) -> Result<TestForEdit> {
        let path = self.test_path(test_id);
        if !path.exists() {
            return Err(FileError::TestNotFound { test_id }.into());
        }
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("无法读取试卷文件: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("无法解析试卷文件: {}", path.display()))
    }

    /// 目录中 JSON 文件的数量
    async fn count_json_files(dir: &Path, prefix: &str) -> Result<usize> {
        if !dir.exists() {
            return Ok(0);
        }
        let mut count = 0;
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(prefix) && name.ends_with(".json") {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn next_test_id(&self) -> Result<i64> {
        let dir = self.tests_dir();
        if !dir.exists() {
            return Ok(1);
        }
        let mut max_id = 0;
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<i64>().ok())
            {
                max_id = max_id.max(id);
            }
        }
        Ok(max_id + 1)
    }
}

/// 给未保存的题目分配持久化 ID，从已用的最大 ID 之后开始
fn assign_persisted_ids(existing: &[QuestionRecord], incoming: &[QuestionRecord]) -> Vec<QuestionRecord> {
    let mut next_id = existing
        .iter()
        .chain(incoming)
        .filter_map(|q| match q.id {
            RecordId::Persisted(id) => Some(id),
            RecordId::Transient(_) => None,
        })
        .max()
        .unwrap_or(0)
        + 1;

    incoming
        .iter()
        .cloned()
        .map(|mut q| {
            if !q.id.is_persisted() {
                q.id = RecordId::Persisted(next_id);
                next_id += 1;
            }
            q
        })
        .collect()
}

impl TestApi for FileTestStore {
    async fn get_test_for_edit(&self, test_id: i64) -> Result<TestForEdit> {
        self.read_bundle(test_id).await
    }

    async fn create_test(&self, payload: &TestPayload) -> Result<SavedTest> {
        let id = self.next_test_id().await?;
        let mut test = payload.test.clone();
        test.id = Some(id);
        let bundle = TestForEdit {
            test,
            questions: assign_persisted_ids(&[], &payload.questions),
            ..TestForEdit::default()
        };
        self.write_bundle(id, &bundle).await?;
        info!("✓ 已创建试卷 {} ({} 道题)", id, payload.questions.len());
        Ok(SavedTest { id })
    }

    async fn update_test(&self, test_id: i64, payload: &TestPayload) -> Result<SavedTest> {
        // 文章与音频由其他模块维护，更新时保留
        let mut bundle = self.read_bundle(test_id).await?;
        bundle.test = payload.test.clone();
        bundle.test.id = Some(test_id);
        bundle.questions = assign_persisted_ids(&bundle.questions, &payload.questions);
        self.write_bundle(test_id, &bundle).await?;
        info!("✓ 已更新试卷 {} ({} 道题)", test_id, payload.questions.len());
        Ok(SavedTest { id: test_id })
    }

    async fn get_test_detail(&self, test_id: i64) -> Result<TestDetail> {
        let bundle = self.read_bundle(test_id).await?;
        Ok(TestDetail {
            test: bundle.test,
            questions: bundle.questions,
            audio: bundle.audio,
        })
    }

    async fn submit_test(&self, test_id: i64, responses: &[Response]) -> Result<SubmitReceipt> {
        let dir = self.attempts_dir();
        fs::create_dir_all(&dir).await?;
        let prefix = format!("{}-", test_id);
        let attempt_id = Self::count_json_files(&dir, &prefix).await? as i64 + 1;

        let path = dir.join(format!("{}{}.json", prefix, attempt_id));
        let record = json!({
            "testId": test_id,
            "attemptId": attempt_id,
            "submittedAt": chrono::Local::now().to_rfc3339(),
            "responses": responses,
        });
        fs::write(&path, serde_json::to_string_pretty(&record)?)
            .await
            .with_context(|| format!("无法写入交卷记录: {}", path.display()))?;

        info!("✓ 试卷 {} 已交卷，记录 {}", test_id, attempt_id);
        Ok(SubmitReceipt { attempt_id })
    }
}
