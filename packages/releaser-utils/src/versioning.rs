use std::cmp::Ordering;

/// Numeric view of a dotted version string, used to order releases for display.
///
/// Every dot-separated component is read as an unsigned integer; anything that
/// does not parse (including empty components) counts as `0`. A single leading
/// `v` is ignored so tags and bare versions compare the same way.
#[derive(Debug, Clone)]
pub struct VersionKey {
    parts: Vec<u64>,
}

impl VersionKey {
    pub fn new(string: &str) -> Self {
        let string = string.strip_prefix('v').unwrap_or(string);
        let parts = string
            .split('.')
            .map(|part| part.trim().parse::<u64>().unwrap_or(0))
            .collect();
        VersionKey { parts }
    }
}

impl PartialEq for VersionKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionKey {}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

/// Ascending comparison of two version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    VersionKey::new(a).cmp(&VersionKey::new(b))
}

/// Newest-first comparison, the order release listings are shown in.
pub fn compare_versions_desc(a: &str, b: &str) -> Ordering {
    compare_versions(b, a)
}
