use crate::error::{AppError, AppResult, FileError};
use crate::models::test_bundle::TestForEdit;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

async fn read_source(bundle_path: &Path) -> AppResult<String> {
    fs::read_to_string(bundle_path)
        .await
        .map_err(|e| AppError::file_read_failed(bundle_path.display().to_string(), e))
}

/// 从 TOML 或 JSON 文件加载试卷数据
pub async fn load_bundle(bundle_path: &Path) -> Result<TestForEdit> {
    let content = read_source(bundle_path).await?;

    let bundle: TestForEdit = match bundle_path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("无法解析TOML文件: {}", bundle_path.display()))?,
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("无法解析JSON文件: {}", bundle_path.display()))?,
        _ => {
            return Err(FileError::UnsupportedExtension {
                path: bundle_path.display().to_string(),
            }
            .into())
        }
    };

    Ok(bundle.with_file_path(bundle_path.to_string_lossy().to_string()))
}

fn is_bundle_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("toml") | Some("json")
    )
}

/// 从文件夹中加载所有试卷文件
///
/// 解析失败的文件记录日志后跳过
pub async fn load_all_bundles(folder_path: &str) -> Result<Vec<TestForEdit>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_bundle_file(&path) {
            paths.push(path);
        }
    }
    // 目录遍历顺序不固定
    paths.sort();

    let mut bundles = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_bundle(&path).await {
            Ok(bundle) => {
                tracing::info!("成功加载 {} 道题目", bundle.questions.len());
                bundles.push(bundle);
            }
            Err(e) => {
                tracing::error!("加载失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(bundles)
}
