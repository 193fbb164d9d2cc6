// 📅 Calendar Index - align a requested date to the last trading day
//
// A ticker's price dates arrive in no particular order. The index sorts them once
// (merge sort) and then answers lookups by binary search.

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

// ============================================================================
// MERGE SORT
// ============================================================================

/// Merge sort. Single-element and empty inputs are already sorted.
pub fn merge_sort<T: Ord + Clone>(items: &[T]) -> Vec<T> {
    if items.len() <= 1 {
        return items.to_vec();
    }

    let middle = items.len() / 2;
    let left = merge_sort(&items[..middle]);
    let right = merge_sort(&items[middle..]);

    merge(left, right)
}

/// Merge two sorted runs. On a tie the right-hand element is taken first.
fn merge<T: Ord>(left: Vec<T>, right: Vec<T>) -> Vec<T> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l < r,
            _ => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }

    merged.extend(left);
    merged.extend(right);
    merged
}

// ============================================================================
// ALIGNMENT
// ============================================================================

/// Outcome of looking a target date up in a trading calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Alignment {
    /// The target is itself a trading day; use it unchanged
    Exact,

    /// The latest trading day strictly before the target
    Prior(NaiveDate),

    /// No trading day on or before the target
    NotFound,
}

impl Alignment {
    /// Date to use for `target`, if any
    pub fn resolve(self, target: NaiveDate) -> Option<NaiveDate> {
        match self {
            Alignment::Exact => Some(target),
            Alignment::Prior(date) => Some(date),
            Alignment::NotFound => None,
        }
    }
}

// ============================================================================
// CALENDAR INDEX
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CalendarIndex {
    /// Trading dates, ascending
    dates: Vec<NaiveDate>,
}

impl CalendarIndex {
    /// Build from unordered dates
    pub fn new<I>(dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let unsorted: Vec<NaiveDate> = dates.into_iter().collect();
        CalendarIndex {
            dates: merge_sort(&unsorted),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Binary search for `target`, tracking the last date seen below it
    pub fn last_date_before(&self, target: NaiveDate) -> Alignment {
        let mut left = 0;
        let mut right = self.dates.len();
        let mut last_found = None;

        while left < right {
            let middle = left + (right - left) / 2;
            let candidate = self.dates[middle];
            match candidate.cmp(&target) {
                Ordering::Greater => right = middle,
                Ordering::Less => {
                    last_found = Some(candidate);
                    left = middle + 1;
                }
                Ordering::Equal => return Alignment::Exact,
            }
        }

        match last_found {
            Some(date) => Alignment::Prior(date),
            None => Alignment::NotFound,
        }
    }

    /// `target` itself when it trades, else the last trading day before it
    pub fn align(&self, target: NaiveDate) -> Option<NaiveDate> {
        self.last_date_before(target).resolve(target)
    }
}
