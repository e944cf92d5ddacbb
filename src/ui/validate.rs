//! Form input checks shared by the item editor and the login prompt.

#[must_use]
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains('@') && !s.chars().any(char::is_whitespace);
    if !clean(local) || !clean(domain) {
        return false;
    }
    // a dot with at least one character on each side
    domain.char_indices().any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[must_use]
pub fn validate_required(value: &str) -> bool {
    !value.trim().is_empty()
}

#[must_use]
pub fn validate_number(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

#[must_use]
pub fn validate_positive_number(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok_and(|n| n.is_finite() && n > 0.0)
}
