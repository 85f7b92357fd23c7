//! Property-Based Tests for the answer validators
//!
//! These tests verify:
//! - The three predicates are total over arbitrary input
//! - Generated well-formed answers are accepted
//! - Whitespace never sneaks into an accepted proxy

use proptest::prelude::*;

use sen_installer::installer::accepts;
use sen_installer::validation::{is_valid_no_proxy, is_valid_proxy, is_valid_ssh_key};
use sen_installer::InputField;

/// Arbitrary text, control characters included
fn any_text() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>(), 0..10_000).prop_map(String::from_iter)
}

fn proxy_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "(http|https)://[a-z0-9-]{1,12}(\\.[a-z0-9-]{1,12}){0,3}\\.[a-z]{2,6}(:[0-9]{1,5})?",
        "(http|https)://localhost(:[0-9]{1,5})?",
    ]
}

fn no_proxy_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9.*-]{1,16}(,[a-z0-9.*-]{1,16}){0,8}"
}

fn ssh_key_strategy() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("ssh-rsa"), Just("ssh-ed25519")],
        "([A-Za-z0-9+/]{4}){1,64}",
        prop_oneof![Just(""), Just("="), Just("==")],
        prop::option::of("[ -~]{0,32}"),
    )
        .prop_map(|(kind, body, padding, comment)| {
            // Padding replaces trailing characters so the length stays a multiple of four
            let blob = format!("{}{}", &body[..body.len() - padding.len()], padding);
            match comment {
                Some(comment) => format!("{} {} {}", kind, blob, comment),
                None => format!("{} {}", kind, blob),
            }
        })
}

// =============================================================================
// Totality
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Validators return for any input without panicking
    #[test]
    fn validators_are_total(input in any_text()) {
        let _ = is_valid_proxy(&input);
        let _ = is_valid_no_proxy(&input);
        let _ = is_valid_ssh_key(&input);
    }

    /// Field acceptance is total as well
    #[test]
    fn accepts_is_total(input in any_text()) {
        for field in [
            InputField::HttpProxy,
            InputField::NoProxy,
            InputField::SshKey,
            InputField::UserName,
        ] {
            let _ = accepts(field, &input);
        }
    }
}

// =============================================================================
// Proxy properties
// =============================================================================

proptest! {
    /// Well-formed proxy URLs are accepted
    #[test]
    fn generated_proxies_accepted(proxy in proxy_strategy()) {
        prop_assert!(is_valid_proxy(&proxy), "rejected {:?}", proxy);
    }

    /// Any whitespace inside an otherwise valid URL is rejected
    #[test]
    fn proxy_with_whitespace_rejected(
        proxy in proxy_strategy(),
        at in any::<prop::sample::Index>(),
        ws in prop_oneof![Just(' '), Just('\t'), Just('\n'), Just('\r')],
    ) {
        let mut chars: Vec<char> = proxy.chars().collect();
        let position = at.index(chars.len() + 1);
        chars.insert(position, ws);
        let mangled: String = chars.into_iter().collect();
        prop_assert!(!is_valid_proxy(&mangled), "accepted {:?}", mangled);
    }

    /// Schemes other than http/https are rejected
    #[test]
    fn proxy_scheme_required(host in "[a-z]{1,12}\\.[a-z]{2,6}") {
        prop_assert!(!is_valid_proxy(&host));
        let ftp = format!("ftp://{}", host);
        prop_assert!(!is_valid_proxy(&ftp));
    }
}

// =============================================================================
// NO_PROXY properties
// =============================================================================

proptest! {
    /// Comma-separated host lists are accepted
    #[test]
    fn generated_no_proxy_accepted(list in no_proxy_strategy()) {
        prop_assert!(is_valid_no_proxy(&list), "rejected {:?}", list);
    }

    /// An empty token anywhere breaks the list
    #[test]
    fn no_proxy_empty_token_rejected(list in no_proxy_strategy()) {
        let leading = format!(",{}", list);
        let trailing = format!("{},", list);
        let doubled = format!("{},,{}", list, list);
        prop_assert!(!is_valid_no_proxy(&leading));
        prop_assert!(!is_valid_no_proxy(&trailing));
        prop_assert!(!is_valid_no_proxy(&doubled));
    }
}

// =============================================================================
// SSH key properties
// =============================================================================

proptest! {
    /// rsa and ed25519 lines with a well-padded blob are accepted
    #[test]
    fn generated_keys_accepted(key in ssh_key_strategy()) {
        prop_assert!(is_valid_ssh_key(&key), "rejected {:?}", key);
    }

    /// Other key types are rejected whatever the blob
    #[test]
    fn other_key_types_rejected(
        kind in "ssh-(dss|dsa|ecdsa|rsa1|ed448)",
        blob in "([A-Za-z0-9+/]{4}){1,16}",
    ) {
        let key = format!("{} {}", kind, blob);
        prop_assert!(!is_valid_ssh_key(&key));
    }
}
