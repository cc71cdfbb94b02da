// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Tag labels and default tag generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::tree::SEPARATOR;

/// Reserved tag that always holds the most recently written content.
pub const LATEST: &str = "latest";

/// Returns whether `tag` can address a single entry: non-empty and free of
/// path separators.
pub fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty() && !tag.contains(SEPARATOR)
}

/// Generates default tags as decimal nanosecond timestamps.
///
/// Each call returns a timestamp strictly greater than every previous one
/// from the same clock, even when the physical clock stalls or steps back.
#[derive(Debug, Default)]
pub struct TagClock {
    last: AtomicU64,
}

impl TagClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next tag.
    pub fn next_tag(&self) -> String {
        self.next_nanos().to_string()
    }

    fn next_nanos(&self) -> u64 {
        loop {
            let physical = Self::physical_time_nanos();
            let last = self.last.load(Ordering::Acquire);
            let next = physical.max(last.saturating_add(1));

            match self
                .last
                .compare_exchange(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(_) => continue,
            }
        }
    }

    fn physical_time_nanos() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_strictly_increase() {
        let clock = TagClock::new();
        let mut last: u64 = clock.next_tag().parse().unwrap();

        for _ in 0..1000 {
            let current: u64 = clock.next_tag().parse().unwrap();
            assert!(current > last, "{} > {}", current, last);
            last = current;
        }
    }

    #[test]
    fn test_tags_are_decimal() {
        let tag = TagClock::new().next_tag();
        assert!(tag.chars().all(|c| c.is_ascii_digit()));
        assert!(is_valid_tag(&tag));
    }

    #[test]
    fn test_tag_validity() {
        assert!(is_valid_tag(LATEST));
        assert!(is_valid_tag("v1.2"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("a/b"));
    }

    #[test]
    fn test_concurrent_tags_unique() {
        let clock = std::sync::Arc::new(TagClock::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = clock.clone();
                std::thread::spawn(move || (0..250).map(|_| clock.next_tag()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }
}
