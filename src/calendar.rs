use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::fmt;

use crate::day_key::DayKey;

/// A calendar month, the period used for "this month" counts and month views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(day: DayKey) -> Self {
        Self {
            year: day.year(),
            month: day.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn first_day(&self) -> DayKey {
        DayKey::new(self.first_date())
    }

    pub fn last_day(&self) -> DayKey {
        DayKey::new(self.next().first_date() - Duration::days(1))
    }

    pub fn contains(&self, day: DayKey) -> bool {
        day.year() == self.year && day.month() == self.month
    }

    /// Every day of the month, ascending.
    pub fn days(&self) -> impl Iterator<Item = DayKey> {
        let month = *self;
        self.first_date()
            .iter_days()
            .take_while(move |d| d.month() == month.month && d.year() == month.year)
            .map(DayKey::new)
    }

    fn first_date(&self) -> NaiveDate {
        // `new` guarantees a valid month; day 1 always exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub day: DayKey,
    pub in_month: bool,
}

/// Weeks covering `month`, each starting on `week_start` and padded with
/// days of the neighbouring months so every week has seven cells.
pub fn month_grid(month: YearMonth, week_start: Weekday) -> Vec<Vec<GridCell>> {
    let first = month.first_date();
    let last = month.last_day().date();

    let lead = (first.weekday().num_days_from_monday() + 7 - week_start.num_days_from_monday()) % 7;
    let mut current = first - Duration::days(i64::from(lead));
    let mut weeks = Vec::new();
    while current <= last {
        let week = (0..7)
            .map(|i| {
                let date = current + Duration::days(i);
                GridCell {
                    day: DayKey::new(date),
                    in_month: month.contains(DayKey::new(date)),
                }
            })
            .collect();
        weeks.push(week);
        current += Duration::days(7);
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigates_across_year_boundaries() {
        let dec = YearMonth::new(2023, 12).unwrap();
        assert_eq!(dec.next(), YearMonth::new(2024, 1).unwrap());
        assert_eq!(dec.next().prev(), dec);
        assert!(YearMonth::new(2024, 13).is_none());
    }

    #[test]
    fn month_bounds_and_days() {
        let feb = YearMonth::new(2024, 2).unwrap();
        assert_eq!(feb.first_day().to_string(), "2024-02-01");
        assert_eq!(feb.last_day().to_string(), "2024-02-29");
        assert_eq!(feb.days().count(), 29);
        assert_eq!(feb.to_string(), "2024-02");
    }

    #[test]
    fn grid_starts_on_monday_and_covers_month() {
        // January 2024 starts on a Monday and ends on a Wednesday.
        let grid = month_grid(YearMonth::new(2024, 1).unwrap(), Weekday::Mon);
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[0][0].day.to_string(), "2024-01-01");
        assert!(grid.iter().all(|w| w.len() == 7));
        let last_week = &grid[4];
        assert_eq!(last_week[2].day.to_string(), "2024-01-31");
        assert!(!last_week[3].in_month);

        // September 2024 starts on a Sunday.
        let sep = month_grid(YearMonth::new(2024, 9).unwrap(), Weekday::Mon);
        assert_eq!(sep[0][0].day.to_string(), "2024-08-26");
        assert!(!sep[0][0].in_month);
        assert!(sep[0][6].in_month);
    }

    #[test]
    fn sunday_first_grid() {
        // March 2024 starts on a Friday and ends on a Sunday.
        let grid = month_grid(YearMonth::new(2024, 3).unwrap(), Weekday::Sun);
        assert_eq!(grid[0][0].day.to_string(), "2024-02-25");
        assert_eq!(grid[0][5].day.to_string(), "2024-03-01");
        assert_eq!(grid.len(), 6);
        assert_eq!(grid[5][0].day.to_string(), "2024-03-31");
        assert!(!grid[5][1].in_month);

        // September 2024 starts on a Sunday, so there is no padding.
        let sep = month_grid(YearMonth::new(2024, 9).unwrap(), Weekday::Sun);
        assert_eq!(sep[0][0].day.to_string(), "2024-09-01");
        assert_eq!(sep.len(), 5);
    }
}
