use serde::{Deserialize, Serialize};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// How many months ahead the month selector offers, current month included
const MONTHS_OFFERED: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TripDuration {
    #[default]
    Weekend,
    Week,
    TwoWeeks,
}

impl TripDuration {
    /// Wire value: length in "weekend units"
    pub fn code(self) -> u8 {
        match self {
            Self::Weekend => 1,
            Self::Week => 2,
            Self::TwoWeeks => 4,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Weekend => Self::Week,
            Self::Week => Self::TwoWeeks,
            Self::TwoWeeks => Self::Weekend,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Weekend => "Weekend",
            Self::Week => "1 Week",
            Self::TwoWeeks => "2 Weeks",
        }
    }
}

/// Flexible travel dates: a month (or any) and a trip length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatesFilter {
    /// Zero-based month, `None` for any month
    pub month: Option<u32>,
    pub duration: TripDuration,
}

impl DatesFilter {
    pub fn month_label(&self) -> &'static str {
        match self.month {
            Some(m) => MONTH_NAMES[(m % 12) as usize],
            None => "All",
        }
    }

    /// Next entry of the month selector given today's zero-based month
    pub fn next_month(&self, current_month: u32) -> Self {
        let options = month_options(current_month);
        let at = options.iter().position(|m| *m == self.month);
        let month = match at {
            Some(i) => options[(i + 1) % options.len()],
            None => None,
        };
        Self { month, ..*self }
    }

    pub fn next_duration(&self) -> Self {
        Self {
            duration: self.duration.next(),
            ..*self
        }
    }
}

/// "All" followed by the current month and the five after it
pub fn month_options(current_month: u32) -> Vec<Option<u32>> {
    std::iter::once(None)
        .chain((0..MONTHS_OFFERED).map(|i| Some((current_month + i) % 12)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_options_wrap_year_end() {
        let options = month_options(9);
        assert_eq!(options, vec![None, Some(9), Some(10), Some(11), Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_month_cycle_returns_to_all() {
        let mut dates = DatesFilter::default();
        let mut labels = Vec::new();
        for _ in 0..7 {
            dates = dates.next_month(10);
            labels.push(dates.month_label());
        }
        assert_eq!(labels, ["November", "December", "January", "February", "March", "April", "All"]);
    }

    #[test]
    fn test_stale_month_resets_to_all() {
        let dates = DatesFilter {
            month: Some(2),
            duration: TripDuration::Week,
        };
        let next = dates.next_month(6);
        assert_eq!(next.month, None);
        assert_eq!(next.duration, TripDuration::Week);
    }

    #[test]
    fn test_duration_codes() {
        assert_eq!(TripDuration::Weekend.code(), 1);
        assert_eq!(TripDuration::Week.code(), 2);
        assert_eq!(TripDuration::TwoWeeks.code(), 4);
        assert_eq!(TripDuration::TwoWeeks.next(), TripDuration::Weekend);
    }
}
