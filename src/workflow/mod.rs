//! 流程层
//!
//! 基于 services 的有状态会话：
//! - `EditSession`：出题编辑，题组 ⇄ 扁平题目列表
//! - `ExamSession`：作答，答题卡与交卷
//! - `Countdown`：考试倒计时

pub mod countdown;
pub mod edit_session;
pub mod exam_session;

pub use countdown::Countdown;
pub use edit_session::{EditSession, TemplateIssue};
pub use exam_session::{ExamSession, SubmitReason};
