use chrono::{Datelike, NaiveDate};

/// Numerology seed for a birthdate, always in `1..=9`.
///
/// Day and month are added as whole numbers, the year digit by digit, and the
/// total is reduced to its digital root.
pub fn seed(birthdate: NaiveDate) -> u8 {
    let year_digits = digit_sum(u64::from(birthdate.year().unsigned_abs()));
    let sum = u64::from(birthdate.day()) + u64::from(birthdate.month()) + year_digits;
    digital_root(sum) as u8
}

fn digit_sum(mut n: u64) -> u64 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

fn digital_root(mut n: u64) -> u64 {
    while n > 9 {
        n = digit_sum(n);
    }
    n
}
