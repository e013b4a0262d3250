//! 单个试卷处理器 - 编排层
//!
//! ## 核心功能
//!
//! 1. **分组**：扁平题目列表 → 题组，记录子类型需要确认的题组
//! 2. **模板检查**：报告无法使用的上下文模板
//! 3. **作答预览**：统计渲染分组与录音分段
//! 4. **同步输出**：题组 → 扁平列表，写入 `<stem>.payload.json`

use crate::config::Config;
use crate::models::test_bundle::TestForEdit;
use crate::services::recording_resolver::{group_by_recording, RecordingPolicy};
use crate::services::render_grouping::plan_render;
use crate::utils::logging::log_set_summary;
use crate::workflow::EditSession;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info};

/// 单个试卷的处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BundleStats {
    pub questions: usize,
    pub sets: usize,
    /// 子类型由上下文推断、尚未确认的题组
    pub unconfirmed_sets: usize,
    pub template_issues: usize,
    pub render_groups: usize,
    pub recordings: usize,
    pub output_path: PathBuf,
}

/// 输出文件名（不含扩展名），没有来源文件时按序号命名
fn output_stem(bundle: &TestForEdit, bundle_index: usize) -> String {
    bundle
        .file_path
        .as_deref()
        .and_then(|p| Path::new(p).file_stem())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| format!("bundle-{}", bundle_index))
}

/// 处理单个试卷
///
/// # 参数
/// - `bundle`: 试卷数据
/// - `bundle_index`: 试卷序号（用于日志）
/// - `config`: 配置
pub async fn process_bundle(
    bundle: TestForEdit,
    bundle_index: usize,
    config: &Config,
) -> Result<BundleStats> {
    let stem = output_stem(&bundle, bundle_index);
    info!(
        "[试卷 {}] 📄 开始处理: {} ({} 道题)",
        bundle_index,
        bundle.test.title,
        bundle.questions.len()
    );

    let session = EditSession::from_bundle(bundle);
    log_set_summary(bundle_index, session.sets());

    let issues = session.validate_templates();
    for issue in &issues {
        error!("[试卷 {}] ❌ {}", bundle_index, issue.error);
    }

    let records = session.records();
    let plan = plan_render(&records);
    let policy = RecordingPolicy::from_config(config);
    let recordings = group_by_recording(&records, session.audio(), &policy);
    for bucket in &recordings {
        info!(
            "[试卷 {}] 🎧 录音 {}: {} 道题",
            bundle_index,
            bucket.recording,
            bucket.questions.len()
        );
    }

    let output_path = write_payload(&session, &config.output_folder, &stem).await?;

    let stats = BundleStats {
        questions: records.len(),
        sets: session.sets().len(),
        unconfirmed_sets: session.sets().iter().filter(|s| s.needs_confirmation()).count(),
        template_issues: issues.len(),
        render_groups: plan.len(),
        recordings: recordings.len(),
        output_path,
    };
    log_bundle_complete(bundle_index, &stats);
    Ok(stats)
}

/// 写入同步后的提交数据
async fn write_payload(session: &EditSession, output_folder: &str, stem: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_folder)
        .await
        .with_context(|| format!("无法创建输出目录: {}", output_folder))?;

    let path = Path::new(output_folder).join(format!("{}.payload.json", stem));
    let content = serde_json::to_string_pretty(&session.payload())?;
    fs::write(&path, content)
        .await
        .with_context(|| format!("无法写入输出文件: {}", path.display()))?;
    Ok(path)
}

fn log_bundle_complete(bundle_index: usize, stats: &BundleStats) {
    info!(
        "[试卷 {}] ✓ 完成: {} 道题, {} 个题组, {} 个渲染分组, {} 段录音",
        bundle_index, stats.questions, stats.sets, stats.render_groups, stats.recordings
    );
    if stats.unconfirmed_sets > 0 || stats.template_issues > 0 {
        info!(
            "[试卷 {}] 待确认子类型: {}, 模板问题: {}",
            bundle_index, stats.unconfirmed_sets, stats.template_issues
        );
    }
    info!("[试卷 {}] 💾 输出: {}", bundle_index, stats.output_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{QuestionRecord, QuestionType};
    use crate::models::reference::Audio;
    use crate::models::test_bundle::{TestMetadata, TestPayload};

    fn bundle() -> TestForEdit {
        TestForEdit {
            test: TestMetadata {
                title: "Listening".into(),
                ..TestMetadata::default()
            },
            questions: vec![
                QuestionRecord::new(1, QuestionType::FillInTheBlank)
                    .with_order(1)
                    .with_instructions("[SUBTYPE:FORM_FILLING] Complete the form")
                    .with_context("Name: ___1___ Phone: ___2___")
                    .with_audio(10),
                QuestionRecord::new(2, QuestionType::FillInTheBlank)
                    .with_order(2)
                    .with_instructions("[SUBTYPE:FORM_FILLING] Complete the form")
                    .with_context("Name: ___1___ Phone: ___2___")
                    .with_audio(10),
                QuestionRecord::new(3, QuestionType::FillInTheBlank)
                    .with_order(11)
                    .with_instructions("Complete")
                    .with_context("The river flows ___9___"),
            ],
            passages: vec![],
            audio: vec![Audio::new(10, "Section 1"), Audio::new(20, "Section 2")],
            file_path: Some("input_tests/listening.toml".into()),
        }
    }

    #[tokio::test]
    async fn test_process_bundle_writes_synchronized_payload() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_folder: dir.path().to_string_lossy().to_string(),
            ..Config::default()
        };
        let original = bundle();

        let stats = process_bundle(original.clone(), 1, &config).await.unwrap();
        assert_eq!(stats.questions, 3);
        assert_eq!(stats.sets, 2);
        assert_eq!(stats.unconfirmed_sets, 1);
        assert_eq!(stats.template_issues, 1);
        assert_eq!(stats.recordings, 2);
        assert_eq!(stats.output_path, dir.path().join("listening.payload.json"));

        let written = std::fs::read_to_string(&stats.output_path).unwrap();
        let payload: TestPayload = serde_json::from_str(&written).unwrap();
        assert_eq!(payload.questions, original.questions);
    }

    #[tokio::test]
    async fn test_bundle_without_source_file_uses_index() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_folder: dir.path().to_string_lossy().to_string(),
            ..Config::default()
        };
        let mut bundle = bundle();
        bundle.file_path = None;

        let stats = process_bundle(bundle, 3, &config).await.unwrap();
        assert_eq!(stats.output_path, dir.path().join("bundle-3.payload.json"));
    }
}
