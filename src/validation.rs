//! Field-level validators.
//!
//! Every function here is pure: it inspects one value and answers yes or no.
//! The payload-level rules that combine them live in [`crate::sanitizer`].

use std::str::FromStr;
use std::sync::LazyLock;

use lettre::message::Mailbox;
use lettre::Address;
use phonenumber::country;
use phonenumber::Mode;
use regex::Regex;
use url::Url;

/// Symbols, besides alphanumerics, allowed inside a user name.
const USERNAME_ALLOWED_SPECIAL_SYMBOLS: &str = "!#$%&'*+/=?^{|}~@.`";

/// URL scheme that executes script when followed.
const JAVASCRIPT_URL_SCHEME: &str = "javascript";

/// Characters that break the CSV encoding of the policy-rule store.
const POLICY_STORAGE_ILLEGAL: &[char] = &['"', '#', ',', '\n', '\r'];

static FIELD_WHITELIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z0-9]+$").expect("static regex"));

static USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    let special = regex::escape(USERNAME_ALLOWED_SPECIAL_SYMBOLS);
    Regex::new(&format!(
        "^([a-zA-Z0-9]+[a-zA-Z0-9\\-_{special}]*[a-zA-Z0-9]+|[a-zA-Z0-9]+)$"
    ))
    .expect("static regex")
});

// Relative references are resolved against this base so that paths such as
// `/img/logo.png` are accepted the same way absolute URLs are.
static RELATIVE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("static base url"));

/// Returns true if `value` is acceptable for a URL-typed field.
///
/// The empty string is valid (URL fields are optional). Anything else must
/// parse as a URL, and its scheme must not be `javascript`.
///
/// # Examples
///
/// ```
/// use tenant_pipeline::validation::is_valid_url;
///
/// assert!(is_valid_url(""));
/// assert!(is_valid_url("https://example.com/x"));
/// assert!(!is_valid_url("javascript:alert(1)"));
/// ```
pub fn is_valid_url(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }

    let parsed = match Url::parse(value) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => match RELATIVE_BASE.join(value) {
            Ok(url) => url,
            Err(_) => return false,
        },
        Err(_) => return false,
    };

    parsed.scheme() != JAVASCRIPT_URL_SCHEME
}

/// Returns true if `value` is an RFC 5322 mailbox, with or without a display name.
pub fn is_valid_email(value: &str) -> bool {
    Address::from_str(value).is_ok() || Mailbox::from_str(value).is_ok()
}

fn parse_region(region: &str) -> Option<country::Id> {
    if region.is_empty() {
        return None;
    }
    region.to_ascii_uppercase().parse::<country::Id>().ok()
}

/// Returns true if `phone` parses as a valid number for the given region hint.
///
/// `region` is an ISO 3166 alpha-2 code such as `"US"`; an empty hint
/// requires the number to carry its own `+` country prefix.
pub fn is_valid_phone(phone: &str, region: &str) -> bool {
    match phonenumber::parse(parse_region(region), phone) {
        Ok(number) => phonenumber::is_valid(&number),
        Err(_) => false,
    }
}

/// Returns true if `region` is in the list of regions allowed for sign-up.
pub fn is_phone_allowed_in_region(region: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|r| r == region)
}

/// Normalizes a phone number to E.164.
///
/// Returns `None` when the number cannot be parsed or is not valid for the
/// region.
pub fn e164_number(phone: &str, region: &str) -> Option<String> {
    let number = phonenumber::parse(parse_region(region), phone).ok()?;
    if !phonenumber::is_valid(&number) {
        return None;
    }
    Some(number.format().mode(Mode::E164).to_string())
}

/// Resolves the region code of a phone number given its country calling prefix.
///
/// Returns `Ok(None)` when either part is empty.
pub fn country_code(prefix: &str, phone: &str) -> Result<Option<String>, String> {
    if prefix.is_empty() || phone.is_empty() {
        return Ok(None);
    }

    let number = phonenumber::parse(None, format!("+{prefix}{phone}"))
        .map_err(|e| format!("invalid phone number: {e}"))?;

    match number.country().id() {
        Some(id) => Ok(Some(AsRef::<str>::as_ref(&id).to_owned())),
        None => Err(format!("country code not found for phone prefix: {prefix}")),
    }
}

/// Returns true if `value` can be stored in the CSV-backed policy-rule store.
///
/// Double quotes, hashes, commas and line breaks would corrupt the rule file.
///
/// # Examples
///
/// ```
/// use tenant_pipeline::validation::is_allowed_for_policy_storage;
///
/// assert!(is_allowed_for_policy_storage("abc-def"));
/// assert!(!is_allowed_for_policy_storage("a,b"));
/// ```
pub fn is_allowed_for_policy_storage(value: &str) -> bool {
    !value.contains(POLICY_STORAGE_ILLEGAL)
}

/// Returns true if `value` may be used as a column name in a sort or filter clause.
///
/// Only ASCII alphanumerics pass. Callers must check user-supplied field names
/// with this before handing them to the store.
pub fn is_allowed_db_identifier(value: &str) -> bool {
    FIELD_WHITELIST.is_match(value)
}

/// Returns true if `value` is an acceptable user name.
pub fn is_valid_username(value: &str) -> bool {
    USERNAME.is_match(value)
}
