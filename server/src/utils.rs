use chrono::{Datelike, NaiveDate};
use rand::Rng;
use regex::Regex;

/// 10-digit local mobile number, first digit 6-9.
pub fn valid_phone_number(phone: &str) -> bool {
    let re = Regex::new(r"^[6-9]\d{9}$").unwrap();
    re.is_match(phone)
}

pub fn valid_email(email: &str) -> bool {
    let re = Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").unwrap();
    re.is_match(email)
}

/// Completed years between the birth date and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();

    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }

    age
}

pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}
