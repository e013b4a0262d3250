//! 业务能力层（引擎）
//!
//! 每个组件都是输入到输出的纯函数，不读取任何全局状态：
//!
//! ```text
//! tag_parser ─┐
//!             ├─ key_builder ─ grouping ─┐
//! reference_resolver ────────────────────┼─ synchronizer
//!                                        │
//! template ─ render_grouping ─ recording_resolver
//! ```

pub mod grouping;
pub mod key_builder;
pub mod recording_resolver;
pub mod reference_resolver;
pub mod render_grouping;
pub mod synchronizer;
pub mod tag_parser;
pub mod template;

pub use grouping::group_records;
pub use key_builder::{build_key, GroupKey};
pub use recording_resolver::{group_by_recording, resolve_recording, RecordingBucket, RecordingPolicy};
pub use reference_resolver::{to_foreign_key, to_ordinal};
pub use render_grouping::{plan_render, render_table, ContextGroup, RenderGroup, TableView};
pub use synchronizer::flatten_sets;
pub use template::{parse_template, RenderedTemplate, Slot};
