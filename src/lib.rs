//! # Exam Composer
//!
//! 试卷题组引擎：把后端的扁平题目列表整理成可编辑的题组，并在保存时还原为扁平列表
//!
//! ## 架构设计
//!
//! ### ① 数据层（Models）
//! - `models/` - 题目记录、题组、文章/音频、答题卡、与后端交换的数据结构
//! - `models/loaders` - 从 TOML / JSON 文件加载试卷
//!
//! ### ② 引擎层（Services）
//! - `services/` - 纯函数组件，不持有状态
//! - 子类型标记解析、分组键、分组、同步、模板、渲染分组、录音分段
//!
//! ### ③ 流程层（Workflow）
//! - `EditSession` - 出题编辑，每次修改后扁平列表自动保持最新
//! - `ExamSession` / `Countdown` - 作答、倒计时与交卷
//!
//! ### ④ 外部协作（Clients）
//! - `TestApi` - 加载、保存、下发、交卷
//! - `HttpTestApi` / `FileTestStore`
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理试卷文件，控制并发
//! - `orchestrator/bundle_processor` - 单个试卷：分组、检查、同步、输出
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{FileTestStore, HttpTestApi, TestApi};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{QuestionRecord, QuestionSet, QuestionType, RecordId, TestForEdit};
pub use orchestrator::{process_bundle, App};
pub use workflow::{Countdown, EditSession, ExamSession, SubmitReason};
