//! Password strength rules.

use std::collections::HashMap;

pub const MIN_LENGTH: usize = 8;
pub const MAX_LENGTH: usize = 4096;
pub const MAX_SIMILARITY: f64 = 0.7;

pub const MSG_TOO_SHORT: &str =
    "This password is too short. It must contain at least 8 characters.";
pub const MSG_TOO_LONG: &str = "Ensure this field has no more than 4096 characters.";
pub const MSG_TOO_COMMON: &str = "This password is too common.";
pub const MSG_NUMERIC: &str = "This password is entirely numeric.";

const COMMON_PASSWORDS: &[&str] = &[
    "123456", "123456789", "12345678", "password", "qwerty", "123123", "111111", "abc123",
    "1234567", "password1", "12345", "1234567890", "000000", "iloveyou", "1q2w3e4r",
    "qwertyuiop", "123321", "monkey", "dragon", "654321", "666666", "123", "myspace1",
    "a123456", "121212", "1qaz2wsx", "123qwe", "123abc", "tinkle", "target123", "gwerty",
    "1g2w3e4r", "gwerty123", "zag12wsx", "7777777", "qwerty123", "password123",
    "letmein", "welcome", "welcome1", "sunshine", "princess", "football", "baseball",
    "master", "shadow", "superman", "trustno1", "passw0rd", "admin", "admin123", "login",
    "starwars", "whatever", "qazwsx", "michael", "charlie", "donald", "freedom", "hello123",
    "changeme", "secret", "matilda",
];

/// Every rule `password` breaks, as user-facing messages. Empty means acceptable.
///
/// `attributes` are `(name, value)` pairs such as `("username", "alice")`
/// the password must not closely resemble.
pub fn check(password: &str, attributes: &[(&str, &str)]) -> Vec<String> {
    let mut problems = Vec::new();

    // Nothing else is evaluated on an oversized password.
    let length = password.chars().count();
    if length > MAX_LENGTH {
        problems.push(MSG_TOO_LONG.to_string());
        return problems;
    }
    if length < MIN_LENGTH {
        problems.push(MSG_TOO_SHORT.to_string());
    }

    let lowered = password.to_lowercase();
    if let Some(name) = attributes
        .iter()
        .find(|(_, value)| too_similar(&lowered, value))
        .map(|(name, _)| *name)
    {
        problems.push(format!("The password is too similar to the {}.", name));
    }

    if COMMON_PASSWORDS.contains(&lowered.trim()) {
        problems.push(MSG_TOO_COMMON.to_string());
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push(MSG_NUMERIC.to_string());
    }

    problems
}

/// Compare against the whole value and each of its alphanumeric runs.
fn too_similar(password: &str, value: &str) -> bool {
    let value = value.to_lowercase();
    value
        .split(|c: char| !c.is_alphanumeric())
        .chain(std::iter::once(value.as_str()))
        .filter(|part| !part.is_empty())
        .any(|part| {
            could_be_similar(password, part) && similarity(password, part) >= MAX_SIMILARITY
        })
}

/// Cheap upper bounds on `similarity`: the length ratio, then the shared
/// character multiset. Both are linear, so the quadratic LCS only runs on
/// pairs that might actually match.
fn could_be_similar(a: &str, b: &str) -> bool {
    let (la, lb) = (a.chars().count(), b.chars().count());
    let total = la + lb;
    if total == 0 {
        return true;
    }
    if 2.0 * la.min(lb) as f64 / (total as f64) < MAX_SIMILARITY {
        return false;
    }
    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let mut shared = 0usize;
    for c in a.chars() {
        if let Some(n) = counts.get_mut(&c) {
            if *n > 0 {
                *n -= 1;
                shared += 1;
            }
        }
    }
    2.0 * shared as f64 / total as f64 >= MAX_SIMILARITY
}

/// `2 * lcs / (len_a + len_b)`; 1.0 for equal strings.
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    2.0 * prev[b.len()] as f64 / total as f64
}
