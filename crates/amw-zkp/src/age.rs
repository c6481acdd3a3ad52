//! Calendar age.
//!
//! Age is whole years by calendar-field subtraction: the year difference,
//! minus one if this year's birthday has not yet arrived. The birthday
//! comparison is on `(month, day)` tuples, so a 29 February birthday is
//! reached on 1 March in non-leap years.

use chrono::{Datelike, NaiveDate};

/// Whole years from `birth` to `on`. Negative if `birth` is after `on`.
pub fn age_in_years(birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// `true` iff the holder is at least `threshold` whole years old on `on`.
pub fn satisfies_age(birth: NaiveDate, on: NaiveDate, threshold: u32) -> bool {
    i64::from(age_in_years(birth, on)) >= i64::from(threshold)
}
