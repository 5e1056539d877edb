use crate::domain::fortune::{DayFortune, FortuneSequence};
use crate::time::forecast::ForecastWindow;
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Peak,
    Stable,
    Caution,
}

impl Tier {
    pub fn for_score(score: u8) -> Self {
        match score {
            8.. => Tier::Peak,
            5..=7 => Tier::Stable,
            _ => Tier::Caution,
        }
    }
}

/// Builds a fortune for `date` without any external input.
///
/// Pure: the same `(date, name, seed)` always yields the same entry.
pub fn generate(date: NaiveDate, name: &str, seed: u8) -> DayFortune {
    let offset = day_offset(date);
    let score = score_for(offset);
    let lucky_number = wrap_to_digit(u32::from(seed) + offset);

    let (description, advice, activities) = match Tier::for_score(score) {
        Tier::Peak => (
            format!(
                "Today is a financial high point for {name}. Money matters are likely to bring \
                 pleasant surprises, and decisions connected with the number {lucky_number} \
                 should go especially smoothly. Unexpected income or investment returns are possible."
            ),
            "Make the most of this rare peak: consider modestly expanding investments and \
             look out for new opportunities."
                .to_string(),
            "investing in stocks, signing contracts, negotiating, business planning, applying for credit"
                .to_string(),
        ),
        Tier::Stable => (
            format!(
                "{name}'s finances are steady today. Income and spending follow their usual course \
                 with no big swings. Working with familiar partners may bring stable gains; avoid \
                 speculative bets."
            ),
            "Keep a measured approach; a good day for routine finances and medium to long-term \
             planning."
                .to_string(),
            "saving, buying insurance, reviewing assets, budgeting, rebalancing a portfolio"
                .to_string(),
        ),
        Tier::Caution => {
            let unlucky_number = wrap_to_digit(u32::from(lucky_number) + 4);
            (
                format!(
                    "{name}'s financial luck is low today. Watch out for impulse purchases and \
                     high-risk investments, and be careful with decisions, especially any deal \
                     involving the number {unlucky_number}."
                ),
                "Play defense: focus on cutting costs and managing risk, and avoid large outlays."
                    .to_string(),
                "cutting expenses, hedging, paying down debt, postponing big purchases, repairing credit"
                    .to_string(),
            )
        }
    };

    DayFortune {
        date,
        score,
        description,
        advice,
        lucky_number,
        activities,
    }
}

/// A full forecast built only from [`generate`].
pub fn generate_sequence(window: &ForecastWindow, name: &str, seed: u8) -> FortuneSequence {
    FortuneSequence::from_window_days((*window.dates()).map(|date| generate(date, name, seed)))
}

/// Day-local seed: day of month plus 31 times the month.
fn day_offset(date: NaiveDate) -> u32 {
    date.day() + 31 * date.month()
}

fn score_for(offset: u32) -> u8 {
    let raw = f64::from(offset).sin() * 5.0 + 5.0;
    raw.round().clamp(1.0, 10.0) as u8
}

/// Maps `n mod 9` onto `1..=9`, with 0 becoming 9.
fn wrap_to_digit(n: u32) -> u8 {
    match (n % 9) as u8 {
        0 => 9,
        r => r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(generate(date, "Alice", 3), generate(date, "Alice", 3));
    }

    #[test]
    fn ranges_hold_for_every_day_and_seed() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for date in start.iter_days().take(366) {
            for seed in 1..=9 {
                let day = generate(date, "Bob", seed);
                assert!((1..=10).contains(&day.score), "score {} on {date}", day.score);
                assert!((1..=9).contains(&day.lucky_number));
                assert!(!day.description.is_empty());
                assert!(!day.advice.is_empty());
                assert!(!day.activities.is_empty());
                assert_eq!(day.date, date);
            }
        }
    }

    #[test]
    fn lucky_number_follows_seed_plus_offset() {
        // offset = 19 + 31 * 10 = 329; (3 + 329) % 9 = 8
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(generate(date, "Alice", 3).lucky_number, 8);
        // offset = 3 + 31 = 34; (2 + 34) % 9 = 0 -> 9
        let date = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert_eq!(generate(date, "Alice", 2).lucky_number, 9);
    }

    #[test]
    fn narrative_mentions_the_person_and_matches_tier() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let mut seen = Vec::new();
        for date in start.iter_days().take(62) {
            let day = generate(date, "Carol", 5);
            assert!(day.description.contains("Carol"));
            let tier = Tier::for_score(day.score);
            match tier {
                Tier::Peak => assert!(day.description.contains(&day.lucky_number.to_string())),
                Tier::Stable => assert!(day.activities.starts_with("saving")),
                Tier::Caution => assert!(day.advice.starts_with("Play defense")),
            }
            if !seen.contains(&tier) {
                seen.push(tier);
            }
        }
        assert_eq!(seen.len(), 3, "two months should cover every tier");
    }

    #[test]
    fn sequence_covers_the_window() {
        let window = ForecastWindow::starting(NaiveDate::from_ymd_opt(2026, 12, 28).unwrap());
        let seq = generate_sequence(&window, "Dana", 7);
        assert_eq!(seq.days().len(), 7);
        assert_eq!(seq.first_date(), window.start());
        assert_eq!(seq.days()[6].date, NaiveDate::from_ymd_opt(2027, 1, 3).unwrap());
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(Tier::for_score(10), Tier::Peak);
        assert_eq!(Tier::for_score(8), Tier::Peak);
        assert_eq!(Tier::for_score(7), Tier::Stable);
        assert_eq!(Tier::for_score(5), Tier::Stable);
        assert_eq!(Tier::for_score(4), Tier::Caution);
        assert_eq!(Tier::for_score(1), Tier::Caution);
    }

    #[test]
    fn wrap_to_digit_never_returns_zero() {
        for n in 0..100 {
            assert!((1..=9).contains(&wrap_to_digit(n)));
        }
        assert_eq!(wrap_to_digit(9), 9);
        assert_eq!(wrap_to_digit(10), 1);
    }
}
