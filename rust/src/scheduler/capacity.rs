//! Worker capacity tracking for one phase, in working-day offsets.

use rustc_hash::FxHashMap;

/// A placed task's hold on the phase crew pool.
///
/// Occupies offsets `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub uid: u32,
    pub start: i64,
    pub end: i64,
    pub workers: u32,
}

/// Daily worker usage against a fixed limit.
///
/// Invariant: for every offset, the sum of `workers` over reservations
/// covering it equals `usage[offset]` and never exceeds `limit`.
#[derive(Clone, Debug)]
pub struct WorkerCapacity {
    limit: u32,
    usage: FxHashMap<i64, u32>,
    reservations: Vec<Reservation>,
}

impl WorkerCapacity {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            usage: FxHashMap::default(),
            reservations: Vec::new(),
        }
    }

    /// Workers already booked on `offset`.
    pub fn used_on(&self, offset: i64) -> u32 {
        self.usage.get(&offset).copied().unwrap_or(0)
    }

    /// Whether `workers` more can be booked on every day of `[start, start + duration)`.
    pub fn fits(&self, start: i64, duration: u32, workers: u32) -> bool {
        (start..start + i64::from(duration)).all(|day| self.used_on(day) + workers <= self.limit)
    }

    pub fn reserve(&mut self, uid: u32, start: i64, duration: u32, workers: u32) {
        let end = start + i64::from(duration);
        for day in start..end {
            *self.usage.entry(day).or_insert(0) += workers;
        }
        self.reservations.push(Reservation {
            uid,
            start,
            end,
            workers,
        });
    }

    /// The earliest-ending reservation still active on or after `candidate`.
    ///
    /// Its `end` is the first offset after that task completes. Ties go to the
    /// lower uid.
    pub fn next_release(&self, candidate: i64) -> Option<Reservation> {
        self.reservations
            .iter()
            .filter(|r| r.end > candidate)
            .min_by_key(|r| (r.end, r.uid))
            .copied()
    }

    /// Highest daily usage so far.
    pub fn peak(&self) -> u32 {
        self.usage.values().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_capacity_fits_up_to_limit() {
        let capacity = WorkerCapacity::new(5);
        assert!(capacity.fits(0, 10, 5));
        assert!(!capacity.fits(0, 1, 6));
        assert_eq!(capacity.peak(), 0);
    }

    #[test]
    fn test_reserve_books_each_day() {
        let mut capacity = WorkerCapacity::new(5);
        capacity.reserve(1, 2, 3, 4);
        assert_eq!(capacity.used_on(1), 0);
        assert_eq!(capacity.used_on(2), 4);
        assert_eq!(capacity.used_on(4), 4);
        assert_eq!(capacity.used_on(5), 0);

        // Overlapping the reservation by one day breaks the limit
        assert!(!capacity.fits(0, 3, 2));
        assert!(capacity.fits(0, 2, 2));
        assert!(capacity.fits(5, 10, 5));
        assert!(capacity.fits(2, 3, 1));
    }

    #[test]
    fn test_next_release() {
        let mut capacity = WorkerCapacity::new(4);
        capacity.reserve(7, 0, 10, 2);
        capacity.reserve(3, 0, 4, 2);
        capacity.reserve(9, 0, 4, 1);

        let release = capacity.next_release(0).unwrap();
        assert_eq!((release.uid, release.end), (3, 4));

        // Reservations that ended before the candidate are ignored
        let release = capacity.next_release(4).unwrap();
        assert_eq!((release.uid, release.end), (7, 10));
        assert!(capacity.next_release(10).is_none());
    }

    #[test]
    fn test_peak() {
        let mut capacity = WorkerCapacity::new(10);
        capacity.reserve(1, 0, 5, 3);
        capacity.reserve(2, 3, 5, 4);
        assert_eq!(capacity.peak(), 7);
    }
}
