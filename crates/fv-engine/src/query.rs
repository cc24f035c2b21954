//! Query filtering, pagination, and date-range clamping.

use fv_models::{ImageRecord, QueryCriteria};

use crate::error::{EngineError, EngineResult};

/// Widest allowed query window: one year in milliseconds.
pub const MAX_DATE_RANGE: i64 = 365 * 24 * 60 * 60 * 1000;

/// Response shape for an image query.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub items: Vec<ImageRecord>,
    pub message: String,
}

/// True iff the criteria carries at least one non-empty filter array.
///
/// Criteria without any non-empty array (including a bare limit) means
/// "everything in range" and bypasses filtering.
pub fn has_criteria(criteria: Option<&QueryCriteria>) -> bool {
    criteria.is_some_and(|c| {
        c.tags.as_ref().is_some_and(|t| !t.is_empty())
            || c.people.as_ref().is_some_and(|p| !p.is_empty())
    })
}

/// Filter items by criteria with OR semantics across keys.
///
/// An item matches when ANY of its tags is in the requested tag list OR
/// any of its people is in the requested people list. This is a union
/// match, not an intersection.
pub fn filter_items_by_criteria(
    items: Vec<ImageRecord>,
    criteria: &QueryCriteria,
) -> Vec<ImageRecord> {
    items
        .into_iter()
        .filter(|item| {
            intersects(criteria.tags.as_deref(), &item.tags)
                || intersects(criteria.people.as_deref(), &item.people)
        })
        .collect()
}

fn intersects(wanted: Option<&[String]>, values: &[String]) -> bool {
    match wanted {
        Some(wanted) if !wanted.is_empty() => values.iter().any(|v| wanted.contains(v)),
        _ => false,
    }
}

/// Truncate results when a positive limit is given.
///
/// A negative or missing limit means no truncation. Ordering beyond the
/// store's own is not guaranteed.
pub fn apply_limit(mut items: Vec<ImageRecord>, limit: Option<i64>) -> Vec<ImageRecord> {
    if let Some(limit) = limit {
        if limit > 0 {
            items.truncate(limit as usize);
        }
    }
    items
}

/// Effective window start, honoring a pagination cursor.
///
/// A client continuation cursor replaces `from` only when it is after
/// `from`; a stale cursor cannot widen the window backwards.
pub fn calculate_from_date(from: i64, last_retrieved_birthtime: Option<i64>) -> i64 {
    match last_retrieved_birthtime {
        Some(cursor) if cursor > from => cursor,
        _ => from,
    }
}

/// Effective window end, clamped to [`MAX_DATE_RANGE`] past `from`.
///
/// A `to` that ends up before `from` is a caller error.
pub fn calculate_to_date(from: i64, to: i64) -> EngineResult<i64> {
    let clamped = to.min(from.saturating_add(MAX_DATE_RANGE));
    if clamped < from {
        return Err(EngineError::InvalidDateRange);
    }
    Ok(clamped)
}

/// Filter, truncate, and build the response message.
pub fn filter_and_paginate(
    items: Vec<ImageRecord>,
    criteria: Option<&QueryCriteria>,
) -> QueryResponse {
    let filtered = match criteria {
        Some(c) if has_criteria(criteria) => filter_items_by_criteria(items, c),
        _ => items,
    };

    let raw_count = filtered.len();
    let items = apply_limit(filtered, criteria.and_then(|c| c.limit));

    let message = if raw_count == 0 {
        "No items found that match your criteria".to_string()
    } else {
        format!("{} items found, {} returned", raw_count, items.len())
    };

    QueryResponse { items, message }
}
