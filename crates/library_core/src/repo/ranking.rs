//! Frequency ranking over borrow records.
//!
//! # Invariants
//! - Scans run in input order; the champion changes only when a running
//!   count strictly exceeds the best count so far, so the value that first
//!   reaches the winning count wins ties.
//! - A ranked value is removed from the working list before the next pass.
//! - Rankings never pad: fewer distinct values yield a shorter result.

use std::collections::HashMap;
use std::hash::Hash;

/// Returns the most frequent value, or `None` for an empty slice.
pub fn most_frequent<T: Eq + Hash + Clone>(items: &[T]) -> Option<T> {
    let mut counts: HashMap<&T, usize> = HashMap::new();
    let mut champion = None;
    let mut highest = 0;

    for item in items {
        let count = counts.entry(item).or_insert(0);
        *count += 1;
        if *count > highest {
            highest = *count;
            champion = Some(item);
        }
    }

    champion.cloned()
}

/// Returns up to `n` values ordered by decreasing frequency.
pub fn rank_by_frequency<T: Eq + Hash + Clone>(items: &[T], n: usize) -> Vec<T> {
    let mut remaining = items.to_vec();
    let mut ranked = Vec::with_capacity(n.min(items.len()));

    while ranked.len() < n {
        let Some(champion) = most_frequent(&remaining) else {
            break;
        };
        remaining.retain(|item| item != &champion);
        ranked.push(champion);
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::{most_frequent, rank_by_frequency};

    #[test]
    fn ranks_by_decreasing_count() {
        let items = [
            "b", "a", "c", "a", "d", "b", "a", "c", "a", "b", "c", "a",
        ];
        assert_eq!(rank_by_frequency(&items, 3), vec!["a", "b", "c"]);
    }

    #[test]
    fn first_value_to_reach_the_top_count_wins_ties() {
        // `b` is seen first but `a` reaches two occurrences first.
        assert_eq!(most_frequent(&["b", "a", "a", "b"]), Some("a"));
        assert_eq!(most_frequent(&["x", "y"]), Some("x"));
    }

    #[test]
    fn short_input_yields_short_ranking() {
        assert_eq!(rank_by_frequency(&["a", "b", "a"], 3), vec!["a", "b"]);
        assert!(rank_by_frequency::<&str>(&[], 3).is_empty());
        assert_eq!(most_frequent::<u8>(&[]), None);
    }

    #[test]
    fn zero_slots_returns_nothing() {
        assert!(rank_by_frequency(&[1, 1, 2], 0).is_empty());
    }
}
