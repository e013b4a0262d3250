//! 批量试卷处理器 - 编排层
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写入日志文件头、输出启动信息
//! 2. **批量加载**：扫描输入目录中的所有试卷文件
//! 3. **并发控制**：使用 Semaphore 限制同时处理的试卷数
//! 4. **分批处理**：每批完成后再开始下一批
//! 5. **全局统计**：汇总所有试卷的处理结果

use crate::config::Config;
use crate::models::test_bundle::TestForEdit;
use crate::orchestrator::bundle_processor;
use crate::utils::logging::{
    init_log_file, log_batch_complete, log_batch_start, log_bundles_loaded, log_startup,
    print_final_stats,
};
use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
}

/// 处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
    /// 成功处理的试卷中存在的模板问题总数
    pub template_issues: usize,
}

/// 批次处理结果
#[derive(Debug, Default)]
struct BatchResult {
    success: usize,
    failed: usize,
    template_issues: usize,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(&config);
        Ok(Self { config })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        let bundles = self.load_bundles().await?;

        if bundles.is_empty() {
            warn!("⚠️ 没有找到待处理的试卷文件，程序结束");
            return Ok(ProcessingStats::default());
        }

        log_bundles_loaded(bundles.len(), self.batch_size());

        let stats = self.process_all_bundles(bundles).await?;

        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
        );
        if stats.template_issues > 0 {
            warn!("⚠️ 共有 {} 个题组的模板无法使用，请检查日志", stats.template_issues);
        }

        Ok(stats)
    }

    fn batch_size(&self) -> usize {
        self.config.max_concurrent_bundles.max(1)
    }

    async fn load_bundles(&self) -> Result<Vec<TestForEdit>> {
        info!("📁 正在扫描待处理的试卷...");
        crate::models::load_all_bundles(&self.config.input_folder).await
    }

    /// 处理所有试卷
    async fn process_all_bundles(&self, bundles: Vec<TestForEdit>) -> Result<ProcessingStats> {
        let batch_size = self.batch_size();
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total = bundles.len();
        let total_batches = total.div_ceil(batch_size);
        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        for (batch_idx, batch) in bundles.chunks(batch_size).enumerate() {
            let batch_start = batch_idx * batch_size;
            let batch_num = batch_idx + 1;

            log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total,
            );

            let result = self
                .process_batch(batch, batch_start, semaphore.clone())
                .await?;

            stats.success += result.success;
            stats.failed += result.failed;
            stats.template_issues += result.template_issues;

            log_batch_complete(batch_num, result.success, result.success + result.failed);
        }

        Ok(stats)
    }

    /// 处理单个批次
    async fn process_batch(
        &self,
        batch: &[TestForEdit],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<BatchResult> {
        let mut handles = Vec::with_capacity(batch.len());

        for (idx, bundle) in batch.iter().enumerate() {
            let bundle_index = batch_start + idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let bundle = bundle.clone();
            let config = self.config.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                bundle_processor::process_bundle(bundle, bundle_index, &config).await
            });
            handles.push((bundle_index, handle));
        }

        // 等待本批所有任务完成
        let outcomes = join_all(
            handles
                .into_iter()
                .map(|(bundle_index, handle)| async move { (bundle_index, handle.await) }),
        )
        .await;

        let mut result = BatchResult::default();
        for (bundle_index, outcome) in outcomes {
            match outcome {
                Ok(Ok(stats)) => {
                    result.success += 1;
                    result.template_issues += stats.template_issues;
                }
                Ok(Err(e)) => {
                    error!("[试卷 {}] ❌ 处理过程中发生错误: {:#}", bundle_index, e);
                    result.failed += 1;
                }
                Err(e) => {
                    error!("[试卷 {}] 任务执行失败: {}", bundle_index, e);
                    result.failed += 1;
                }
            }
        }

        Ok(result)
    }
}
