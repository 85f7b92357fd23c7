//! Format checks for operator answers.
//!
//! Three total predicates over arbitrary strings. They never panic and run in
//! time linear in the input: the `regex` crate compiles to a finite automaton,
//! so adversarial input cannot trigger backtracking blowups.
//!
//! # Accepted shapes
//!
//! - Proxy: `http://` or `https://`, then an FQDN whose last label is two or
//!   more ASCII letters (or the literal `localhost`), then an optional
//!   `:port` of 1-5 digits. The port is not range-checked, so `:99999`
//!   passes. Downstream scripts depend on that accepted set.
//! - SSH key: empty, or `ssh-rsa`/`ssh-ed25519`, one space, a base64 blob,
//!   then optionally one whitespace character and a free-form comment.
//! - NO_PROXY: empty, or comma-separated tokens with no whitespace and no
//!   empty tokens.

use std::sync::LazyLock;

use regex::Regex;

static PROXY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(http://|https://)([A-Za-z0-9.-]+\.[A-Za-z]{2,}|localhost)(:[0-9]{1,5})?$")
        .expect("proxy pattern is a valid regex")
});

static SSH_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ssh-(rsa|ed25519) ([A-Za-z0-9+/=]+)(?:\s(.*))?$")
        .expect("ssh key pattern is a valid regex")
});

static NO_PROXY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^,\s]+(,[^,\s]+)*$").expect("no_proxy pattern is a valid regex")
});

/// Returns true if `value` is a well-formed HTTP(S) proxy URL.
///
/// The empty string is rejected here. Callers treat an empty answer as
/// "no proxy" and only consult this predicate for non-empty input.
pub fn is_valid_proxy(value: &str) -> bool {
    PROXY_RE.is_match(value)
}

/// Returns true if `value` is empty or an `ssh-rsa`/`ssh-ed25519` public key line.
///
/// Only the blob segment is constrained: it must use the base64 alphabet,
/// carry padding only at its end and have a length that is a multiple of
/// four. Whatever follows the whitespace after the blob is a comment.
pub fn is_valid_ssh_key(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    let Some(caps) = SSH_KEY_RE.captures(value) else {
        return false;
    };
    caps.get(2).is_some_and(|blob| is_base64_blob(blob.as_str()))
}

/// Returns true if `value` is empty or a comma-separated list of non-blank hosts.
pub fn is_valid_no_proxy(value: &str) -> bool {
    value.is_empty() || NO_PROXY_RE.is_match(value)
}

fn is_base64_blob(blob: &str) -> bool {
    if blob.len() % 4 != 0 {
        return false;
    }
    let data = blob.trim_end_matches('=');
    blob.len() - data.len() <= 2 && !data.is_empty() && !data.contains('=')
}
