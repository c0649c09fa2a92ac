use chrono::Utc;

use crate::constants::SESSION_ID_PREFIX;

/// Source of fresh session ids.
///
/// `is_taken` reports ids the registry already holds; a generator must never
/// return one of them. Ids must sort in creation order.
pub trait IdGenerator: Send {
    fn next_id(&mut self, is_taken: &dyn Fn(&str) -> bool) -> String;
}

/// Clock-seeded ids (`session_<millis>`), strictly increasing even when two
/// sessions are created within the same millisecond.
#[derive(Debug, Default)]
pub struct MonotonicIds {
    last: i64,
}

impl MonotonicIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for MonotonicIds {
    fn next_id(&mut self, is_taken: &dyn Fn(&str) -> bool) -> String {
        let mut candidate = Utc::now().timestamp_millis().max(self.last + 1);
        loop {
            let id = format!("{SESSION_ID_PREFIX}{candidate}");
            if !is_taken(&id) {
                self.last = candidate;
                return id;
            }
            candidate += 1;
        }
    }
}

/// Plain counter ids (`session_000001`, ...). Deterministic, for tests.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, is_taken: &dyn Fn(&str) -> bool) -> String {
        loop {
            self.next += 1;
            let id = format!("{SESSION_ID_PREFIX}{:06}", self.next);
            if !is_taken(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_ids_never_repeat() {
        let mut ids = MonotonicIds::new();
        let a = ids.next_id(&|_| false);
        let b = ids.next_id(&|_| false);
        let c = ids.next_id(&|_| false);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_taken_ids_are_skipped() {
        let mut ids = SequentialIds::new();
        let id = ids.next_id(&|id| id == "session_000001" || id == "session_000002");
        assert_eq!(id, "session_000003");
    }

    #[test]
    fn test_monotonic_skips_taken_id() {
        let mut ids = MonotonicIds::new();
        let first = ids.next_id(&|_| false);
        let millis: i64 = first.trim_start_matches(SESSION_ID_PREFIX).parse().unwrap();
        let blocked = format!("{SESSION_ID_PREFIX}{}", millis + 1);

        let next = ids.next_id(&|id| id == blocked);
        assert_ne!(next, blocked);
        assert!(next > first);
    }
}
