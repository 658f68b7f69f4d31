//! Field-level validators shared by the establishment and role rows.

use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;

/// Maximum length of a full email address.
const MAX_EMAIL_LENGTH: usize = 320;

/// Domains accepted as-is even though they have no TLD.
const DOMAIN_ALLOWLIST: &[&str] = &["localhost"];

/// French ten-digit phone numbers, optionally grouped by pairs.
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9])(?:[ _.-]?(\d{2})){4}$").unwrap());

/// Dot-atom or quoted-string local part.
static EMAIL_USER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^[-!#$%&'*+/=?^_`{}|~0-9A-Z]+(?:\.[-!#$%&'*+/=?^_`{}|~0-9A-Z]+)*\z|^"(?:[\x01-\x08\x0b\x0c\x0e-\x1f!#-\[\]-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*"\z"#,
    )
    .unwrap()
});

/// Hostname labels followed by a TLD. The TLD must not end with `-`, which is
/// checked separately.
static EMAIL_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z0-9-]{2,63}\z").unwrap()
});

/// Bracketed IP literal, e.g. `[192.168.0.1]`.
static EMAIL_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\[([A-F0-9:.]+)\]\z").unwrap());

pub fn phone_number_is_valid(phone: &str) -> bool {
    PHONE.is_match(phone)
}

/// Validate an email address the way web-framework email validators do.
///
/// Empty values are rejected; callers decide whether the field is optional.
pub fn email_is_valid(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return false;
    }
    let Some((user, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if !EMAIL_USER.is_match(user) {
        return false;
    }
    if DOMAIN_ALLOWLIST.contains(&domain) || domain_is_valid(domain) {
        return true;
    }
    if domain.is_ascii() {
        return false;
    }
    domain_is_valid(&ascii_placeholder(domain))
}

fn domain_is_valid(domain: &str) -> bool {
    if EMAIL_DOMAIN.is_match(domain) {
        return !domain.ends_with('-');
    }
    EMAIL_LITERAL
        .captures(domain)
        .and_then(|caps| caps.get(1))
        .is_some_and(|ip| ip.as_str().parse::<IpAddr>().is_ok())
}

/// Replace every non-ASCII alphanumeric character by `a` so that an
/// internationalized domain can be checked against the ASCII hostname rules.
/// Any other non-ASCII character is kept and makes the check fail.
///
/// A label holding non-ASCII characters is also padded to the shortest length
/// its punycode form (`xn--`, the ASCII characters, a `-` delimiter when there
/// are any, at least one character per non-ASCII one) can have, so labels
/// whose encoding is certain to exceed 63 characters are rejected. The exact
/// punycode length can be longer, so a label close to the limit may still
/// pass.
fn ascii_placeholder(domain: &str) -> String {
    domain
        .split('.')
        .map(placeholder_label)
        .collect::<Vec<_>>()
        .join(".")
}

fn placeholder_label(label: &str) -> String {
    if label.is_ascii() {
        return label.to_owned();
    }
    let mut mapped: String = label
        .chars()
        .map(|c| {
            if !c.is_ascii() && c.is_alphanumeric() {
                'a'
            } else {
                c
            }
        })
        .collect();
    let padding = "xn--".len() + usize::from(label.chars().any(|c| c.is_ascii()));
    // Pad after the first character so the leading and trailing characters
    // still face the hostname rules.
    let first = mapped.chars().next().map_or(0, char::len_utf8);
    mapped.insert_str(first, &"a".repeat(padding));
    mapped
}
