//! Per-instance name suffixes.
//!
//! Every node inside a macro instance carries that instance's suffix in its
//! name (`"Noop[[m:7]]"`). Nested instances stack suffixes. The suffix keeps
//! names unique when one definition is instantiated repeatedly, and gives a
//! cheap "does this node belong to instance X" test. It is stripped from every
//! display string.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

const SUFFIX_OPEN: &str = "[[m:";
const SUFFIX_CLOSE: &str = "]]";

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique token identifying one macro instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceSuffix(u64);

impl InstanceSuffix {
    /// Take the next value of the process-wide counter.
    pub fn next() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }

    /// Use an explicit token. Callers mixing this with `next()` are
    /// responsible for not reusing a value.
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// The text appended to internal node names.
    pub fn tag(self) -> String {
        format!("{}{}{}", SUFFIX_OPEN, self.0, SUFFIX_CLOSE)
    }

    /// Append this suffix to a node name.
    pub fn apply(self, name: &str) -> String {
        format!("{}{}", name, self.tag())
    }

    /// Whether a node name belongs to this instance.
    pub fn is_member(self, name: &str) -> bool {
        name.contains(&self.tag())
    }
}

impl fmt::Display for InstanceSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", SUFFIX_OPEN, self.0, SUFFIX_CLOSE)
    }
}

/// Remove every instance suffix from a name.
pub fn strip_instance_suffixes(name: &str) -> Cow<'_, str> {
    if !name.contains(SUFFIX_OPEN) {
        return Cow::Borrowed(name);
    }

    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(start) = rest.find(SUFFIX_OPEN) {
        let after_open = &rest[start + SUFFIX_OPEN.len()..];
        let digits = after_open
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits > 0 && after_open[digits..].starts_with(SUFFIX_CLOSE) {
            out.push_str(&rest[..start]);
            rest = &after_open[digits + SUFFIX_CLOSE.len()..];
        } else {
            // Not a suffix, keep the literal text.
            out.push_str(&rest[..start + SUFFIX_OPEN.len()]);
            rest = after_open;
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Every instance suffix carried by a name, innermost first.
pub fn instance_suffixes(name: &str) -> Vec<InstanceSuffix> {
    let mut found = Vec::new();
    let mut rest = name;
    while let Some(start) = rest.find(SUFFIX_OPEN) {
        let after_open = &rest[start + SUFFIX_OPEN.len()..];
        let digits = after_open
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits > 0 && after_open[digits..].starts_with(SUFFIX_CLOSE) {
            if let Ok(value) = after_open[..digits].parse::<u64>() {
                found.push(InstanceSuffix(value));
            }
            rest = &after_open[digits + SUFFIX_CLOSE.len()..];
        } else {
            rest = after_open;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_next_is_unique() {
        let a = InstanceSuffix::next();
        let b = InstanceSuffix::next();
        assert_ne!(a, b);
        assert!(b.value() > a.value());
    }

    #[test]
    fn test_concurrent_next_is_unique() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| (0..100).map(|_| InstanceSuffix::next()).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn test_membership() {
        let suffix = InstanceSuffix::from_raw(1);
        assert!(suffix.is_member("Noop[[m:1]]"));
        assert!(!suffix.is_member("Noop[[m:12]]"));
        assert!(!suffix.is_member("Noop"));
        assert!(InstanceSuffix::from_raw(12).is_member("Noop[[m:3]][[m:12]]"));
    }

    #[test]
    fn test_strip() {
        assert_eq!(strip_instance_suffixes("Noop"), "Noop");
        assert_eq!(strip_instance_suffixes("Noop[[m:5]]"), "Noop");
        assert_eq!(strip_instance_suffixes("Noop[[m:5]][[m:6]]"), "Noop");
        assert_eq!(strip_instance_suffixes("a[[m:x]]b"), "a[[m:x]]b");
        assert_eq!(strip_instance_suffixes("a[[m:]]"), "a[[m:]]");
    }

    #[test]
    fn test_instance_suffixes_lists_innermost_first() {
        assert_eq!(
            instance_suffixes("Noop[[m:5]][[m:6]]"),
            vec![InstanceSuffix::from_raw(5), InstanceSuffix::from_raw(6)]
        );
        assert!(instance_suffixes("Noop").is_empty());
    }

    proptest! {
        #[test]
        fn test_apply_then_strip_restores_name(
            name in "[A-Za-z_ :]{1,20}",
            values in prop::collection::vec(0u64..1_000_000, 0..4)
        ) {
            let mut suffixed = name.clone();
            for value in &values {
                suffixed = InstanceSuffix::from_raw(*value).apply(&suffixed);
            }
            prop_assert_eq!(strip_instance_suffixes(&suffixed).into_owned(), name);
            for value in &values {
                prop_assert!(InstanceSuffix::from_raw(*value).is_member(&suffixed));
            }
        }
    }
}
