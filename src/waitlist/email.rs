//! Email address syntax check.
//!
//! Accepts the common `local@domain.tld` shape:
//! - local part of ASCII letters, digits and `_ ' + - .`, not starting with
//!   `.` and ending in a letter, digit, `_`, `+` or `-`
//! - one or more domain labels starting with a letter or digit, followed by
//!   letters, digits or `-`
//! - a top-level domain of at least two ASCII letters
//! - no `..` anywhere
//!
//! Quoted local parts, IP literals and internationalized domains are rejected.

/// True if `address` is a syntactically valid email address.
pub fn is_valid_email(address: &str) -> bool {
    if address.contains("..") {
        return false;
    }

    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    valid_local_part(local) && valid_domain(domain)
}

fn valid_local_part(local: &str) -> bool {
    let bytes = local.as_bytes();
    let (Some(&first), Some(&last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    first != b'.'
        && bytes
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'\'' | b'+' | b'-' | b'.'))
        && (last.is_ascii_alphanumeric() || matches!(last, b'_' | b'+' | b'-'))
}

fn valid_domain(domain: &str) -> bool {
    let Some((labels, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    tld.len() >= 2
        && tld.bytes().all(|b| b.is_ascii_alphabetic())
        && labels.split('.').all(valid_label)
}

fn valid_label(label: &str) -> bool {
    let mut bytes = label.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            bytes.all(|b| b.is_ascii_alphanumeric() || b == b'-')
        }
        _ => false,
    }
}
