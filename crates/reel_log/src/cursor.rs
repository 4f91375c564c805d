//! Time-indexed cursor over recorded items.
//!
//! Moving forward applies only the items that became due since the last call.
//! Moving backward resets to the start and replays everything up to the
//! requested time, because tree mutations cannot be undone.

use reel_core::SessionTime;

/// Anything stamped with a recording time
pub trait Timed {
    /// Recording time of the item
    fn time(&self) -> SessionTime;
}

/// Ordered sequence of timed items with an application pointer
#[derive(Debug, Clone)]
pub struct TimedEventCursor<T> {
    items: Vec<T>,
    position: usize,
    last_time: Option<SessionTime>,
}

impl<T: Timed> TimedEventCursor<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            position: 0,
            last_time: None,
        }
    }

    /// Append an item. Items must arrive in non-decreasing time order.
    pub fn append(&mut self, item: T) {
        self.items.push(item);
    }

    /// Apply every due item up to and including `t`.
    ///
    /// If `t` precedes the last applied item the pointer is reset first and
    /// the history is replayed from the beginning. The first error stops the
    /// pass; the failing item stays unapplied.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `apply`
    pub fn advance_to<F, E>(&mut self, t: SessionTime, mut apply: F) -> Result<usize, E>
    where
        F: FnMut(&T) -> Result<(), E>,
    {
        if self.last_time.is_some_and(|last| t < last) {
            self.reset();
        }

        let mut applied = 0;
        while let Some(item) = self.items.get(self.position) {
            if item.time() > t {
                break;
            }
            apply(item)?;
            self.last_time = Some(item.time());
            self.position += 1;
            applied += 1;
        }
        Ok(applied)
    }

    /// Last item with time at or before `t`, without moving the pointer
    #[must_use]
    pub fn last_at_or_before(&self, t: SessionTime) -> Option<&T> {
        let end = self.items.partition_point(|item| item.time() <= t);
        end.checked_sub(1).and_then(|i| self.items.get(i))
    }

    /// Rewind the pointer to the start
    pub fn reset(&mut self) {
        self.position = 0;
        self.last_time = None;
    }

    /// Number of items already applied
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Time of the last applied item
    #[must_use]
    pub const fn last_applied_time(&self) -> Option<SessionTime> {
        self.last_time
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Time of the last item in the sequence
    #[must_use]
    pub fn end_time(&self) -> Option<SessionTime> {
        self.items.last().map(Timed::time)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Timed> Default for TimedEventCursor<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::convert::Infallible;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Tick(u64);

    impl Timed for Tick {
        fn time(&self) -> SessionTime {
            SessionTime::from_millis(self.0)
        }
    }

    fn cursor_of(times: &[u64]) -> TimedEventCursor<Tick> {
        let mut cursor = TimedEventCursor::new();
        for &t in times {
            cursor.append(Tick(t));
        }
        cursor
    }

    fn collect_to(cursor: &mut TimedEventCursor<Tick>, t: u64) -> Vec<u64> {
        let mut seen = Vec::new();
        cursor
            .advance_to(SessionTime::from_millis(t), |tick| {
                seen.push(tick.0);
                Ok::<_, Infallible>(())
            })
            .unwrap();
        seen
    }

    #[test]
    fn test_cursor_new() {
        let cursor: TimedEventCursor<Tick> = TimedEventCursor::new();
        assert!(cursor.is_empty());
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.last_applied_time(), None);
    }

    #[test]
    fn test_forward_applies_only_new_items() {
        let mut cursor = cursor_of(&[0, 5, 10, 15]);
        assert_eq!(collect_to(&mut cursor, 5), vec![0, 5]);
        assert_eq!(collect_to(&mut cursor, 12), vec![10]);
        assert_eq!(collect_to(&mut cursor, 12), Vec::<u64>::new());
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_backward_replays_from_start() {
        let mut cursor = cursor_of(&[0, 5, 10, 15]);
        collect_to(&mut cursor, 15);
        assert_eq!(collect_to(&mut cursor, 7), vec![0, 5]);
        assert_eq!(cursor.last_applied_time(), Some(SessionTime::from_millis(5)));
    }

    #[test]
    fn test_seek_between_items_is_not_backward() {
        let mut cursor = cursor_of(&[0, 10, 20]);
        collect_to(&mut cursor, 15);
        // 12 is before the requested 15 but after the last applied item (10)
        assert_eq!(collect_to(&mut cursor, 12), Vec::<u64>::new());
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_equal_times_all_applied() {
        let mut cursor = cursor_of(&[3, 3, 3, 4]);
        assert_eq!(collect_to(&mut cursor, 3), vec![3, 3, 3]);
    }

    #[test]
    fn test_items_appended_after_advance() {
        let mut cursor = cursor_of(&[1, 2]);
        collect_to(&mut cursor, 100);
        cursor.append(Tick(50));
        assert_eq!(collect_to(&mut cursor, 100), vec![50]);
    }

    #[test]
    fn test_error_leaves_item_unapplied() {
        let mut cursor = cursor_of(&[1, 2, 3]);
        let result = cursor.advance_to(SessionTime::from_millis(3), |tick| {
            if tick.0 == 2 { Err("boom") } else { Ok(()) }
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.last_applied_time(), Some(SessionTime::from_millis(1)));
    }

    #[test]
    fn test_last_at_or_before() {
        let cursor = cursor_of(&[5, 10, 10, 20]);
        assert_eq!(cursor.last_at_or_before(SessionTime::from_millis(4)), None);
        assert_eq!(cursor.last_at_or_before(SessionTime::from_millis(10)), Some(&Tick(10)));
        assert_eq!(cursor.last_at_or_before(SessionTime::from_millis(99)), Some(&Tick(20)));
        // pure query
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_end_time() {
        assert_eq!(cursor_of(&[]).end_time(), None);
        assert_eq!(cursor_of(&[1, 9]).end_time(), Some(SessionTime::from_millis(9)));
    }

    proptest! {
        #[test]
        fn prop_stepwise_equals_single_jump(
            mut times in proptest::collection::vec(0u64..200, 0..40),
            mut stops in proptest::collection::vec(0u64..250, 1..8),
        ) {
            times.sort_unstable();
            stops.sort_unstable();
            let target = *stops.last().unwrap();

            let mut stepwise = cursor_of(&times);
            let mut seen = Vec::new();
            for stop in &stops {
                seen.extend(collect_to(&mut stepwise, *stop));
            }

            let mut jump = cursor_of(&times);
            prop_assert_eq!(seen, collect_to(&mut jump, target));
        }

        #[test]
        fn prop_backward_equals_fresh(
            mut times in proptest::collection::vec(0u64..200, 1..40),
            late in 0u64..250,
            early in 0u64..250,
        ) {
            times.sort_unstable();
            let (early, late) = (early.min(late), early.max(late));
            let mut cursor = cursor_of(&times);
            collect_to(&mut cursor, late);
            collect_to(&mut cursor, early);

            let mut fresh = cursor_of(&times);
            collect_to(&mut fresh, early);
            prop_assert_eq!(cursor.position(), fresh.position());
            prop_assert_eq!(cursor.last_applied_time(), fresh.last_applied_time());
        }
    }
}
