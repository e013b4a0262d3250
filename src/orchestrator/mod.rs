//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量试卷处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载试卷（Vec<TestForEdit>）
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `bundle_processor` - 单个试卷处理器
//! - 分组、模板检查、渲染预览
//! - 同步并写出提交数据
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<TestForEdit>)
//!     ↓
//! bundle_processor (处理单个 TestForEdit)
//!     ↓
//! workflow::EditSession
//!     ↓
//! services (分组 / 同步 / 模板 / 渲染分组 / 录音分段)
//! ```

pub mod batch_processor;
pub mod bundle_processor;

pub use batch_processor::{App, ProcessingStats};
pub use bundle_processor::{process_bundle, BundleStats};
