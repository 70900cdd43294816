//! Package version ordering compatible with pacman's `vercmp`.
//!
//! Versions follow the `epoch:version-release` layout. Epoch defaults to `0`
//! and the release is only compared when both sides carry one.

use std::cmp::Ordering;

use thiserror::Error;

/// Version strings the comparator refuses to order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// One side was empty.
    #[error("empty version string")]
    Empty,
    /// One side contained whitespace or control characters.
    #[error("invalid version string {0:?}")]
    Malformed(String),
}

/// What: Three-way ordering oracle for installed vs. remote versions.
///
/// Inputs:
/// - `local`: Installed version string.
/// - `remote`: Version reported by the registry.
///
/// Output:
/// - `Ok(Ordering)` of `local` relative to `remote`, or `VersionError` when
///   either string is unusable.
///
/// Details:
/// - Implementations must be pure and thread-safe; the reconciliation
///   pipeline shares one instance across all workers.
pub trait VersionComparator: Send + Sync + 'static {
    /// Compare `local` against `remote`.
    ///
    /// # Errors
    /// - Returns `VersionError` when either input cannot be ordered.
    fn compare(&self, local: &str, remote: &str) -> Result<Ordering, VersionError>;
}

/// Native port of libalpm's `alpm_pkg_vercmp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Vercmp;

impl VersionComparator for Vercmp {
    fn compare(&self, local: &str, remote: &str) -> Result<Ordering, VersionError> {
        validate(local)?;
        validate(remote)?;
        Ok(vercmp(local, remote))
    }
}

/// Reject strings that cannot be a package version.
fn validate(version: &str) -> Result<(), VersionError> {
    if version.is_empty() {
        return Err(VersionError::Empty);
    }
    if version
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(VersionError::Malformed(version.to_string()));
    }
    Ok(())
}

/// Split `epoch:version-release` into its parts.
fn parse_evr(full: &str) -> (&str, &str, Option<&str>) {
    let digits = full.bytes().take_while(u8::is_ascii_digit).count();
    let (epoch, rest) = if full.as_bytes().get(digits) == Some(&b':') {
        let epoch = &full[..digits];
        (if epoch.is_empty() { "0" } else { epoch }, &full[digits + 1..])
    } else {
        ("0", full)
    };
    match rest.rfind('-') {
        Some(dash) => (epoch, &rest[..dash], Some(&rest[dash + 1..])),
        None => (epoch, rest, None),
    }
}

/// What: Compare two full `epoch:version-release` strings.
///
/// Inputs:
/// - `a`, `b`: Version strings.
///
/// Output:
/// - `Ordering` of `a` relative to `b`.
///
/// Details:
/// - Epoch first, then version, then release when both carry one.
#[must_use]
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (epoch_a, ver_a, rel_a) = parse_evr(a);
    let (epoch_b, ver_b, rel_b) = parse_evr(b);
    rpmvercmp(epoch_a, epoch_b)
        .then_with(|| rpmvercmp(ver_a, ver_b))
        .then_with(|| match (rel_a, rel_b) {
            (Some(ra), Some(rb)) => rpmvercmp(ra, rb),
            _ => Ordering::Equal,
        })
}

/// Segment-wise comparison of a single version component.
///
/// Alternating runs of digits and letters are compared pairwise; numeric
/// runs beat alphabetic ones, and a longer separator run sorts higher.
fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut one, mut two) = (0usize, 0usize);
    let (mut seg1, mut seg2) = (0usize, 0usize);

    while one < a.len() && two < b.len() {
        while one < a.len() && !a[one].is_ascii_alphanumeric() {
            one += 1;
        }
        while two < b.len() && !b[two].is_ascii_alphanumeric() {
            two += 1;
        }
        if one >= a.len() || two >= b.len() {
            break;
        }
        let (sep1, sep2) = (one - seg1, two - seg2);
        if sep1 != sep2 {
            return sep1.cmp(&sep2);
        }

        seg1 = one;
        seg2 = two;
        let is_num = a[seg1].is_ascii_digit();
        let class: fn(&u8) -> bool = if is_num {
            u8::is_ascii_digit
        } else {
            u8::is_ascii_alphabetic
        };
        while seg1 < a.len() && class(&a[seg1]) {
            seg1 += 1;
        }
        while seg2 < b.len() && class(&b[seg2]) {
            seg2 += 1;
        }

        if two == seg2 {
            // numeric beats alpha
            return if is_num {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let mut left = &a[one..seg1];
        let mut right = &b[two..seg2];
        if is_num {
            left = trim_leading_zeros(left);
            right = trim_leading_zeros(right);
            match left.len().cmp(&right.len()) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        match left.cmp(right) {
            Ordering::Equal => {}
            ord => return ord,
        }

        one = seg1;
        two = seg2;
    }

    let rest_a = a.get(one).copied();
    let rest_b = b.get(two).copied();
    // a leftover alpha run never beats an exhausted string
    match (rest_a, rest_b) {
        (None, None) => Ordering::Equal,
        (None, Some(c)) if !c.is_ascii_alphabetic() => Ordering::Less,
        (Some(c), _) if c.is_ascii_alphabetic() => Ordering::Less,
        _ => Ordering::Greater,
    }
}

/// Drop leading `0` digits from a numeric segment.
fn trim_leading_zeros(seg: &[u8]) -> &[u8] {
    let zeros = seg.iter().take_while(|&&c| c == b'0').count();
    &seg[zeros..]
}
