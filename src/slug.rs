//! Slug derivation for article titles.
//!
//! `generate` is a pure normalisation of a title. `generate_unique` picks the
//! next free numeric suffix after the highest one already taken, so with
//! `hello-world`, `hello-world-1` and `hello-world-5` in use the next slug is
//! `hello-world-6`.

use regex::Regex;

/// Returned for titles that normalise to nothing.
pub const FALLBACK: &str = "untitled";

lazy_static! {
    static ref DISALLOWED: Regex = Regex::new(r"[^a-z0-9\-]").unwrap();
    static ref HYPHEN_RUNS: Regex = Regex::new(r"-+").unwrap();
}

pub fn generate(title: &str) -> String {
    let lowered = title.to_lowercase().replace(' ', "-");
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let collapsed = HYPHEN_RUNS.replace_all(&stripped, "-");
    let slug = collapsed.trim_matches('-');
    if slug.is_empty() {
        FALLBACK.to_string()
    } else {
        slug.to_string()
    }
}

pub fn generate_unique<S: AsRef<str>>(title: &str, existing: &[S]) -> String {
    let base = generate(title);
    let taken = |candidate: &str| existing.iter().any(|s| s.as_ref() == candidate);
    if !taken(&base) {
        return base;
    }

    let prefix = format!("{}-", base);
    let highest = existing
        .iter()
        .filter_map(|s| numeric_suffix(s.as_ref(), &prefix))
        .max()
        .unwrap_or(0);

    if let Some(next) = highest.checked_add(1) {
        let candidate = format!("{}{}", prefix, next);
        if !taken(&candidate) {
            return candidate;
        }
    }

    // Suffix space exhausted; the set is finite so this terminates.
    (1u64..)
        .map(|n| format!("{}{}", prefix, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}

/// True when `slug` is `base` itself or `base-<digits>`.
pub fn is_variant_of(slug: &str, base: &str) -> bool {
    slug == base || numeric_suffix(slug, &format!("{}-", base)).is_some()
}

fn numeric_suffix(slug: &str, prefix: &str) -> Option<u64> {
    let suffix = slug.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}
