//! Precedence ordering shared by nested types and deferred selectors.

/// Order value for items that must come first.
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// Order value for items that declare no order at all.
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Stable sort by ascending order value.
///
/// Items with equal order keep their original relative position, which is
/// what makes the outcome independent of hash iteration order.
pub fn sort_by_order<T>(items: &mut [T], order: impl Fn(&T) -> i32) {
    items.sort_by_key(|item| order(item));
}
