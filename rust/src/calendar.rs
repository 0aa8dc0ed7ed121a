//! Working-day arithmetic over the Portuguese public holiday calendar.
//!
//! A working day is any Monday-Friday that is not a national holiday. The
//! movable feasts (Good Friday, Corpus Christi) hang off Easter Sunday, which
//! is computed with the Gregorian computus for any year.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Fixed-date national holidays as (month, day).
const FIXED_HOLIDAYS: [(u32, u32); 10] = [
    (1, 1),   // Ano Novo
    (4, 25),  // Dia da Liberdade
    (5, 1),   // Dia do Trabalhador
    (6, 10),  // Dia de Portugal
    (8, 15),  // Assunção de Nossa Senhora
    (10, 5),  // Implantação da República
    (11, 1),  // Todos os Santos
    (12, 1),  // Restauração da Independência
    (12, 8),  // Imaculada Conceição
    (12, 25), // Natal
];

/// Good Friday offset from Easter Sunday.
const GOOD_FRIDAY_OFFSET: u64 = 2;
/// Corpus Christi offset from Easter Sunday.
const CORPUS_CHRISTI_OFFSET: u64 = 60;

/// Easter Sunday for `year` (anonymous Gregorian algorithm).
///
/// Returns `None` only when the resulting date is outside chrono's range.
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b.div_euclid(4);
    let e = b.rem_euclid(4);
    let f = (b + 8).div_euclid(25);
    let g = (b - f + 1).div_euclid(3);
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c.div_euclid(4);
    let k = c.rem_euclid(4);
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l).div_euclid(451);
    let month = (h + l - 7 * m + 114).div_euclid(31);
    let day = (h + l - 7 * m + 114).rem_euclid(31) + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// All national holidays of `year`, sorted.
pub fn portuguese_holidays(year: i32) -> Vec<NaiveDate> {
    let mut holidays: Vec<NaiveDate> = FIXED_HOLIDAYS
        .iter()
        .filter_map(|&(month, day)| NaiveDate::from_ymd_opt(year, month, day))
        .collect();
    if let Some(easter) = easter_sunday(year) {
        holidays.extend(easter.checked_sub_days(Days::new(GOOD_FRIDAY_OFFSET)));
        holidays.extend(easter.checked_add_days(Days::new(CORPUS_CHRISTI_OFFSET)));
    }
    holidays.sort();
    holidays
}

/// Whether `date` is a Portuguese national holiday.
pub fn is_portuguese_holiday(date: NaiveDate) -> bool {
    if FIXED_HOLIDAYS.contains(&(date.month(), date.day())) {
        return true;
    }
    // Good Friday falls in March/April, Corpus Christi in May/June
    if !(3..=6).contains(&date.month()) {
        return false;
    }
    match easter_sunday(date.year()) {
        Some(easter) => {
            easter.checked_sub_days(Days::new(GOOD_FRIDAY_OFFSET)) == Some(date)
                || easter.checked_add_days(Days::new(CORPUS_CHRISTI_OFFSET)) == Some(date)
        }
        None => false,
    }
}

/// Whether `date` is neither a weekend day nor a holiday.
pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !is_portuguese_holiday(date)
}

/// Advance `date` by `n` working days. `n == 0` returns `date` unchanged.
pub fn add_working_days(date: NaiveDate, n: u32) -> NaiveDate {
    let mut current = date;
    let mut remaining = n;
    while remaining > 0 {
        let Some(next) = current.succ_opt() else {
            return current;
        };
        current = next;
        if is_working_day(current) {
            remaining -= 1;
        }
    }
    current
}

/// Step back from `date` by `n` working days. `n == 0` returns `date` unchanged.
pub fn subtract_working_days(date: NaiveDate, n: u32) -> NaiveDate {
    let mut current = date;
    let mut remaining = n;
    while remaining > 0 {
        let Some(prev) = current.pred_opt() else {
            return current;
        };
        current = prev;
        if is_working_day(current) {
            remaining -= 1;
        }
    }
    current
}

/// First working day on or after `date`.
pub fn next_working_day(date: NaiveDate) -> NaiveDate {
    let mut current = date;
    while !is_working_day(current) {
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

/// Last working day on or before `date`.
pub fn previous_working_day(date: NaiveDate) -> NaiveDate {
    let mut current = date;
    while !is_working_day(current) {
        match current.pred_opt() {
            Some(prev) => current = prev,
            None => break,
        }
    }
    current
}

/// Number of working days in `[start, end]` (inclusive). Zero if `end < start`.
pub fn working_days_between(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_working_day(*d))
        .count() as u32
}

/// Finish date of work that starts on `start` and lasts `duration_days`
/// working days. The start day counts as the first day of work.
pub fn finish_from_start(start: NaiveDate, duration_days: u32) -> NaiveDate {
    if duration_days == 0 {
        return start;
    }
    add_working_days(next_working_day(start), duration_days - 1)
}

/// Bidirectional mapping between working-day offsets and dates.
///
/// Offset 0 is the first working day on or after the origin. Built per call
/// and grown lazily; never shared between schedules.
#[derive(Clone, Debug)]
pub struct WorkdayIndex {
    days: Vec<NaiveDate>,
}

impl WorkdayIndex {
    pub fn new(origin: NaiveDate) -> Self {
        Self {
            days: vec![next_working_day(origin)],
        }
    }

    /// First working day of the index.
    pub fn origin(&self) -> NaiveDate {
        self.days[0]
    }

    fn extend_to_offset(&mut self, offset: usize) {
        while self.days.len() <= offset {
            let last = self.days[self.days.len() - 1];
            let next = add_working_days(last, 1);
            if next == last {
                break;
            }
            self.days.push(next);
        }
    }

    fn extend_to_date(&mut self, date: NaiveDate) {
        while self.days[self.days.len() - 1] < date {
            let len = self.days.len();
            self.extend_to_offset(len);
            if self.days.len() == len {
                break;
            }
        }
    }

    /// Working day at `offset` (negative offsets clamp to the origin).
    pub fn date_at(&mut self, offset: i64) -> NaiveDate {
        let idx = offset.max(0) as usize;
        self.extend_to_offset(idx);
        self.days[idx.min(self.days.len() - 1)]
    }

    /// Offset of `date`; a non-working date maps to the next working day.
    /// Dates before the origin map to 0.
    pub fn offset_of(&mut self, date: NaiveDate) -> i64 {
        self.extend_to_date(date);
        self.days.partition_point(|d| *d < date) as i64
    }

    /// Finish date for an exclusive early-finish offset.
    ///
    /// Work occupying offsets `[es, ef)` finishes on the working day at
    /// `ef - 1`; a zero-length item at `ef` sits on the day before it, which
    /// is where its triggering predecessor finished.
    pub fn finish_date_for(&mut self, ef: i64) -> NaiveDate {
        if ef <= 0 {
            self.origin()
        } else {
            self.date_at(ef - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_easter_known_years() {
        assert_eq!(easter_sunday(2024), Some(d(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(d(2025, 4, 20)));
        assert_eq!(easter_sunday(2026), Some(d(2026, 4, 5)));
        assert_eq!(easter_sunday(2000), Some(d(2000, 4, 23)));
        assert_eq!(easter_sunday(2038), Some(d(2038, 4, 25)));
    }

    #[test]
    fn test_holidays_2026() {
        for date in [
            d(2026, 4, 25),
            d(2026, 1, 1),
            d(2026, 12, 25),
            d(2026, 5, 1),
            d(2026, 6, 10),
            d(2026, 4, 3), // Good Friday
            d(2026, 6, 4), // Corpus Christi
        ] {
            assert!(is_portuguese_holiday(date), "{} should be a holiday", date);
        }
        assert!(!is_portuguese_holiday(d(2026, 3, 10)));
        assert!(!is_portuguese_holiday(d(2026, 4, 5))); // Easter Sunday itself is a Sunday
    }

    #[test]
    fn test_holiday_list_is_sorted_and_complete() {
        let holidays = portuguese_holidays(2026);
        assert_eq!(holidays.len(), 12);
        assert!(holidays.windows(2).all(|w| w[0] < w[1]));
        assert!(holidays.contains(&d(2026, 4, 3)));
        assert!(holidays.contains(&d(2026, 6, 4)));
    }

    #[test]
    fn test_working_day() {
        assert!(is_working_day(d(2026, 3, 10))); // Tuesday
        assert!(!is_working_day(d(2026, 3, 7))); // Saturday
        assert!(!is_working_day(d(2026, 3, 8))); // Sunday
        assert!(!is_working_day(d(2026, 4, 3))); // Good Friday
    }

    #[test]
    fn test_add_zero_is_identity() {
        for date in [d(2026, 3, 7), d(2026, 4, 25), d(2026, 3, 10)] {
            assert_eq!(add_working_days(date, 0), date);
        }
    }

    #[test]
    fn test_add_skips_weekend() {
        assert_eq!(add_working_days(d(2026, 3, 6), 1), d(2026, 3, 9));
    }

    #[test]
    fn test_add_skips_thursday_holiday() {
        // 2024-04-25 is a Thursday
        assert_eq!(add_working_days(d(2024, 4, 24), 1), d(2024, 4, 26));
    }

    #[test]
    fn test_add_skips_holiday_abutting_weekend() {
        // Thu 2026-04-02 -> Good Friday + weekend -> Mon 2026-04-06
        assert_eq!(add_working_days(d(2026, 4, 2), 1), d(2026, 4, 6));
        // Fri 2026-12-04 -> weekend + Tue 8 Dec holiday -> Mon 7, then Wed 9
        assert_eq!(add_working_days(d(2026, 12, 4), 2), d(2026, 12, 9));
    }

    #[test]
    fn test_add_always_lands_on_working_day() {
        let mut date = d(2026, 1, 1);
        for _ in 0..400 {
            for n in 1..4 {
                assert!(is_working_day(add_working_days(date, n)));
            }
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_subtract_mirrors_add() {
        let start = d(2026, 4, 2);
        let later = add_working_days(start, 7);
        assert_eq!(subtract_working_days(later, 7), start);
    }

    #[test]
    fn test_working_days_between() {
        // Mon 2026-03-09 .. Fri 2026-03-13
        assert_eq!(working_days_between(d(2026, 3, 9), d(2026, 3, 13)), 5);
        // Week with Good Friday
        assert_eq!(working_days_between(d(2026, 3, 30), d(2026, 4, 5)), 4);
        assert_eq!(working_days_between(d(2026, 3, 13), d(2026, 3, 9)), 0);
    }

    #[test]
    fn test_finish_from_start() {
        assert_eq!(finish_from_start(d(2026, 3, 9), 1), d(2026, 3, 9));
        assert_eq!(finish_from_start(d(2026, 3, 9), 5), d(2026, 3, 13));
        assert_eq!(finish_from_start(d(2026, 3, 9), 6), d(2026, 3, 16));
        assert_eq!(finish_from_start(d(2026, 3, 7), 0), d(2026, 3, 7));
    }

    #[test]
    fn test_workday_index_round_trip() {
        let mut index = WorkdayIndex::new(d(2026, 3, 7)); // Saturday
        assert_eq!(index.origin(), d(2026, 3, 9));
        assert_eq!(index.date_at(0), d(2026, 3, 9));
        assert_eq!(index.date_at(5), d(2026, 3, 16));
        assert_eq!(index.offset_of(d(2026, 3, 16)), 5);
        // Saturday maps to the following Monday's offset
        assert_eq!(index.offset_of(d(2026, 3, 14)), 5);
        assert_eq!(index.offset_of(d(2026, 1, 1)), 0);
        assert_eq!(index.finish_date_for(5), d(2026, 3, 13));
        assert_eq!(index.finish_date_for(0), d(2026, 3, 9));
    }
}
