//! Pure date arithmetic for subscription cycles.
//!
//! Nothing in this module touches the database; the processor threads the
//! persisted checkpoint through [next_due].

use time::{Date, Duration};

use crate::subscription::core::Frequency;

/// Advance `base_date` by exactly one period of `frequency`.
///
/// Monthly and yearly steps clamp the day-of-month to the length of the
/// target month: one month after 2024-01-31 is 2024-02-29, and one year
/// after 2024-02-29 is 2025-02-28.
pub fn next_occurrence(frequency: Frequency, base_date: Date) -> Date {
    match frequency {
        Frequency::Daily => base_date + Duration::days(1),
        Frequency::Weekly => base_date + Duration::days(7),
        Frequency::Monthly => {
            let (year, month) = match base_date.month() {
                time::Month::December => (base_date.year() + 1, time::Month::January),
                month => (base_date.year(), month.next()),
            };

            clamped_date(year, month, base_date.day())
        }
        Frequency::Yearly => clamped_date(base_date.year() + 1, base_date.month(), base_date.day()),
    }
}

/// The occurrence of a subscription that is due as of `now`, if any.
///
/// The candidate is the first occurrence after `last_materialized`, or
/// `start_date` itself when nothing has been materialized yet (the start
/// date is the first occurrence). The candidate is due when it is on or
/// before `now`: an occurrence landing exactly on `now` counts as due.
///
/// Each call yields at most one occurrence; the caller advances the
/// checkpoint after materializing it, so a subscription that has fallen
/// behind catches up one occurrence per processing pass.
pub fn next_due(
    frequency: Frequency,
    start_date: Date,
    last_materialized: Option<Date>,
    now: Date,
) -> Option<Date> {
    let candidate = match last_materialized {
        Some(last) => next_occurrence(frequency, last),
        None => start_date,
    };

    (candidate <= now).then_some(candidate)
}

/// The date with the day-of-month clamped to the length of the month.
fn clamped_date(year: i32, month: time::Month, day: u8) -> Date {
    Date::from_calendar_date(year, month, day.min(month.length(year)))
        .expect("day is clamped to the length of the month")
}

#[cfg(test)]
mod next_occurrence_tests {
    use time::macros::date;

    use crate::subscription::{core::Frequency, schedule::next_occurrence};

    #[test]
    fn daily_advances_one_day() {
        assert_eq!(
            next_occurrence(Frequency::Daily, date!(2024 - 03 - 15)),
            date!(2024 - 03 - 16)
        );
    }

    #[test]
    fn daily_crosses_leap_day() {
        assert_eq!(
            next_occurrence(Frequency::Daily, date!(2024 - 02 - 28)),
            date!(2024 - 02 - 29)
        );
    }

    #[test]
    fn weekly_advances_seven_days() {
        assert_eq!(
            next_occurrence(Frequency::Weekly, date!(2024 - 12 - 30)),
            date!(2025 - 01 - 06)
        );
    }

    #[test]
    fn monthly_keeps_day_of_month() {
        assert_eq!(
            next_occurrence(Frequency::Monthly, date!(2024 - 03 - 15)),
            date!(2024 - 04 - 15)
        );
    }

    #[test]
    fn monthly_clamps_to_month_length() {
        // One month after 31 January lands on the last day of February.
        assert_eq!(
            next_occurrence(Frequency::Monthly, date!(2024 - 01 - 31)),
            date!(2024 - 02 - 29)
        );
        assert_eq!(
            next_occurrence(Frequency::Monthly, date!(2023 - 01 - 31)),
            date!(2023 - 02 - 28)
        );
    }

    #[test]
    fn monthly_wraps_year_end() {
        assert_eq!(
            next_occurrence(Frequency::Monthly, date!(2024 - 12 - 31)),
            date!(2025 - 01 - 31)
        );
    }

    #[test]
    fn yearly_clamps_leap_day() {
        assert_eq!(
            next_occurrence(Frequency::Yearly, date!(2024 - 02 - 29)),
            date!(2025 - 02 - 28)
        );
    }
}
