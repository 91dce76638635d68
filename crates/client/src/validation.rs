//! Synchronous checks of checkout input.
//!
//! These are advisory: they catch obvious mistakes before a request is sent,
//! and the backend validates everything again. ZIP codes are checked against
//! the US format only.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use sheshape_core::PaymentMethod;

use crate::types::{Address, CheckoutRequest, PaymentDetails};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("Invalid regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]+$").expect("Invalid regex"));

static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").expect("Invalid regex"));

static CARD_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{16}$").expect("Invalid regex"));

static CVV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3,4}$").expect("Invalid regex"));

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Wire name of the offending field, e.g. `zipCode` or
    /// `billingAddress.city`.
    pub field: String,
    pub message: String,
}

/// All failed checks for one piece of input, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Messages only, in order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.message.as_str())
    }

    /// The first error reported for `field`.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    fn merge_prefixed(&mut self, prefix: &str, other: Self) {
        for error in other.errors {
            self.errors.push(FieldError {
                field: format!("{prefix}.{}", error.field),
                message: format!("Billing {}", lowercase_first(&error.message)),
            });
        }
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self.messages().collect::<Vec<_>>().join("; ");
        f.write_str(&joined)
    }
}

/// Email format: something@something.something, no whitespace around the @.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Phone format: optional leading `+`, then digits, spaces, dashes and
/// parentheses.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// US ZIP or ZIP+4.
#[must_use]
pub fn is_valid_zip(zip: &str) -> bool {
    ZIP_RE.is_match(zip)
}

/// Check an address: every required field present, then email (when given),
/// phone and ZIP formats.
#[must_use]
pub fn validate_address(address: &Address) -> ValidationReport {
    let mut report = ValidationReport::default();

    let required = [
        ("firstName", "First name", &address.first_name),
        ("lastName", "Last name", &address.last_name),
        ("phone", "Phone", &address.phone),
        ("street", "Street", &address.street),
        ("city", "City", &address.city),
        ("state", "State", &address.state),
        ("zipCode", "ZIP code", &address.zip_code),
        ("country", "Country", &address.country),
    ];
    for (field, label, value) in required {
        if value.trim().is_empty() {
            report.push(field, format!("{label} is required"));
        }
    }

    if let Some(email) = address.email.as_deref().filter(|e| !e.trim().is_empty())
        && !is_valid_email(email)
    {
        report.push("email", "Please enter a valid email address");
    }

    if !address.phone.trim().is_empty() && !is_valid_phone(&address.phone) {
        report.push("phone", "Please enter a valid phone number");
    }

    if !address.zip_code.trim().is_empty() && !is_valid_zip(address.zip_code.trim()) {
        report.push("zipCode", "Please enter a valid ZIP code");
    }

    report
}

/// Check payment input for `method` as of `today`.
///
/// Card methods need a holder name, a 16-digit number (spaces ignored), an
/// expiry month and year that have not passed, and a 3 or 4 digit CVV. A card
/// is usable through the last day of its expiry month. Other methods carry no
/// client-side checks.
#[must_use]
pub fn validate_payment(
    method: PaymentMethod,
    details: Option<&PaymentDetails>,
    today: NaiveDate,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    if !method.is_card() {
        return report;
    }

    let empty = PaymentDetails::default();
    let details = details.unwrap_or(&empty);

    if details
        .card_holder_name
        .as_deref()
        .is_none_or(|name| name.trim().is_empty())
    {
        report.push("cardHolderName", "Card holder name is required");
    }

    let number: String = details
        .card_number
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if number.is_empty() {
        report.push("cardNumber", "Card number is required");
    } else if !CARD_NUMBER_RE.is_match(&number) {
        report.push("cardNumber", "Please enter a valid 16-digit card number");
    }

    match details.expiry_month {
        None => report.push("expiryMonth", "Expiry month is required"),
        Some(month) if !(1..=12).contains(&month) => {
            report.push("expiryMonth", "Please enter a valid expiry month");
        }
        Some(_) => {}
    }
    if details.expiry_year.is_none() {
        report.push("expiryYear", "Expiry year is required");
    }
    if let (Some(month), Some(year)) = (details.expiry_month, details.expiry_year)
        && (1..=12).contains(&month)
        && (i32::from(year), u32::from(month)) < (today.year(), today.month())
    {
        report.push("expiryYear", "Card has expired");
    }

    match details.cvv.as_deref().map(str::trim) {
        None | Some("") => report.push("cvv", "CVV is required"),
        Some(cvv) if !CVV_RE.is_match(cvv) => {
            report.push("cvv", "Please enter a valid 3 or 4-digit CVV");
        }
        Some(_) => {}
    }

    report
}

/// Check a whole checkout request: shipping address, billing address when
/// given, and payment.
#[must_use]
pub fn validate_checkout(request: &CheckoutRequest, today: NaiveDate) -> ValidationReport {
    let mut report = validate_address(&request.shipping_address);
    if let Some(billing) = &request.billing_address {
        report.merge_prefixed("billingAddress", validate_address(billing));
    }
    let payment = validate_payment(
        request.payment_method,
        request.payment_details.as_ref(),
        today,
    );
    report.errors.extend(payment.errors);
    report
}

/// Group card digits in fours, dropping anything that is not a digit and
/// anything past 16 digits: `"4242424242424242"` → `"4242 4242 4242 4242"`.
#[must_use]
pub fn format_card_number(value: &str) -> String {
    let digits: Vec<char> = value.chars().filter(char::is_ascii_digit).take(16).collect();
    digits
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}
