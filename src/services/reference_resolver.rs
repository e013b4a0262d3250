//! 外键与序号互转
//!
//! 序号是当前内存列表中的位置（从 1 开始），只在列表不变时有效，
//! 列表一旦增删或重排就必须重新计算，不能缓存。

use crate::models::reference::Referenced;
use tracing::warn;

/// 外键 → 序号，找不到时返回 None
pub fn to_ordinal<T: Referenced>(foreign_key: i64, list: &[T]) -> Option<usize> {
    match list.iter().position(|entry| entry.ref_id() == foreign_key) {
        Some(index) => Some(index + 1),
        None => {
            warn!(
                "⚠️ 引用 {} 不在当前列表中 (共 {} 项)，视为无关联",
                foreign_key,
                list.len()
            );
            None
        }
    }
}

/// 可选外键 → 序号
pub fn resolve_ordinal<T: Referenced>(foreign_key: Option<i64>, list: &[T]) -> Option<usize> {
    foreign_key.and_then(|key| to_ordinal(key, list))
}

/// 序号 → 外键，越界时返回 None
pub fn to_foreign_key<T: Referenced>(ordinal: usize, list: &[T]) -> Option<i64> {
    ordinal
        .checked_sub(1)
        .and_then(|index| list.get(index))
        .map(Referenced::ref_id)
}

/// 列表变化后重新计算序号
///
/// 先按旧列表取外键，再在新列表中定位
pub fn remap_ordinal<T: Referenced>(ordinal: Option<usize>, old: &[T], new: &[T]) -> Option<usize> {
    let foreign_key = ordinal.and_then(|o| to_foreign_key(o, old))?;
    to_ordinal(foreign_key, new)
}
