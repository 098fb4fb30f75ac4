//! Terraform Enterprise release versions
//!
//! Releases were named `vYYYYMM-N` until the switch to semantic versions
//! (`1.0.0`). Every semantic release is newer than every dated release.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;
use thiserror::Error;

const LEGACY_PATTERN: &str = r"^v(\d{4})(0[1-9]|1[0-2])-(\d+)$";
const MODERN_PATTERN: &str = r"^v?(\d+)\.(\d+)\.(\d+)(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$";

#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
    #[error("unrecognised version format: {0:?}")]
    Unrecognized(String),

    #[error("{feature} requires Terraform Enterprise {minimum} or later, found {actual}")]
    Unsupported {
        feature: String,
        minimum: String,
        actual: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFormat {
    /// `vYYYYMM-N`
    Legacy,
    /// `X.Y.Z`, optionally prefixed with `v`
    Modern,
}

fn pattern(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

fn legacy_regex() -> Option<&'static Regex> {
    static LEGACY: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(&LEGACY, LEGACY_PATTERN)
}

fn modern_regex() -> Option<&'static Regex> {
    static MODERN: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(&MODERN, MODERN_PATTERN)
}

pub fn matches_legacy(version: &str) -> bool {
    legacy_key(version).is_ok()
}

/// The pattern narrows the candidates; semver decides
pub fn matches_modern(version: &str) -> bool {
    modern_regex().is_some_and(|re| re.is_match(version)) && modern_version(version).is_ok()
}

pub fn classify(version: &str) -> Option<VersionFormat> {
    if matches_legacy(version) {
        Some(VersionFormat::Legacy)
    } else if matches_modern(version) {
        Some(VersionFormat::Modern)
    } else {
        None
    }
}

/// `(year * 100 + month, release)`
fn legacy_key(version: &str) -> Result<(u32, u64), VersionError> {
    let unrecognized = || VersionError::Unrecognized(version.to_string());
    let caps = legacy_regex()
        .and_then(|re| re.captures(version))
        .ok_or_else(unrecognized)?;

    let year: u32 = caps[1].parse().map_err(|_| unrecognized())?;
    let month: u32 = caps[2].parse().map_err(|_| unrecognized())?;
    let release: u64 = caps[3].parse().map_err(|_| unrecognized())?;
    Ok((year * 100 + month, release))
}

fn modern_version(version: &str) -> Result<semver::Version, VersionError> {
    semver::Version::parse(version.strip_prefix('v').unwrap_or(version))
        .map_err(|_| VersionError::Unrecognized(version.to_string()))
}

pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, VersionError> {
    let format_a = classify(a).ok_or_else(|| VersionError::Unrecognized(a.to_string()))?;
    let format_b = classify(b).ok_or_else(|| VersionError::Unrecognized(b.to_string()))?;

    match (format_a, format_b) {
        (VersionFormat::Legacy, VersionFormat::Legacy) => Ok(legacy_key(a)?.cmp(&legacy_key(b)?)),
        (VersionFormat::Modern, VersionFormat::Modern) => {
            Ok(modern_version(a)?.cmp(&modern_version(b)?))
        }
        (VersionFormat::Modern, VersionFormat::Legacy) => Ok(Ordering::Greater),
        (VersionFormat::Legacy, VersionFormat::Modern) => Ok(Ordering::Less),
    }
}

pub fn is_at_least(version: &str, minimum: &str) -> Result<bool, VersionError> {
    Ok(compare_versions(version, minimum)? != Ordering::Less)
}

/// HCP Terraform sends no `X-TFE-Version` header and always passes
pub fn ensure_minimum_tfe_version(
    remote: Option<&str>,
    minimum: &str,
    feature: &str,
) -> Result<(), VersionError> {
    let Some(actual) = remote else {
        return Ok(());
    };

    if is_at_least(actual, minimum)? {
        Ok(())
    } else {
        Err(VersionError::Unsupported {
            feature: feature.to_string(),
            minimum: minimum.to_string(),
            actual: actual.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn classify_recognises_both_formats() {
        assert_eq!(classify("v202401-1"), Some(VersionFormat::Legacy));
        assert_eq!(classify("1.0.0"), Some(VersionFormat::Modern));
        assert_eq!(classify("v1.2.3"), Some(VersionFormat::Modern));
        assert_eq!(classify("1.0.0-rc.1"), Some(VersionFormat::Modern));
        assert_eq!(classify("202401-1"), None);
        assert_eq!(classify("v2024-1"), None);
        assert_eq!(classify("latest"), None);
    }

    #[test]
    fn classify_only_accepts_comparable_versions() {
        for rejected in ["01.2.3", "1.0.0-rc..1", "1.02.0", "v202413-1", "v202400-1", "vv1.0.0"] {
            assert_eq!(classify(rejected), None, "{rejected}");
        }
        for accepted in ["v202401-1", "v202412-3", "1.0.0-rc.1", "v1.2.3+build.5"] {
            assert!(classify(accepted).is_some(), "{accepted}");
            assert_eq!(compare_versions(accepted, accepted), Ok(Ordering::Equal));
        }
    }

    #[test]
    fn legacy_versions_compare_by_month_then_release() {
        assert_eq!(compare_versions("v202401-1", "v202401-2"), Ok(Ordering::Less));
        assert_eq!(compare_versions("v202312-9", "v202401-1"), Ok(Ordering::Less));
        assert_eq!(compare_versions("v202402-10", "v202402-9"), Ok(Ordering::Greater));
        assert_eq!(compare_versions("v202402-1", "v202402-1"), Ok(Ordering::Equal));
    }

    #[test]
    fn modern_is_newer_than_any_legacy() {
        assert_eq!(compare_versions("1.0.0", "v209912-99"), Ok(Ordering::Greater));
        assert_eq!(compare_versions("v209912-99", "0.0.1"), Ok(Ordering::Less));
        assert_eq!(compare_versions("1.10.0", "1.9.3"), Ok(Ordering::Greater));
    }

    #[test]
    fn unrecognised_versions_are_errors() {
        assert_eq!(
            compare_versions("nightly", "1.0.0"),
            Err(VersionError::Unrecognized("nightly".to_string()))
        );
    }

    #[test]
    fn minimum_version_gate() {
        assert!(ensure_minimum_tfe_version(None, "1.0.0", "Stacks").is_ok());
        assert!(ensure_minimum_tfe_version(Some("1.1.0"), "1.0.0", "Stacks").is_ok());

        let err = ensure_minimum_tfe_version(Some("v202406-1"), "1.0.0", "Stacks").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Stacks requires Terraform Enterprise 1.0.0 or later, found v202406-1"
        );
    }

    fn legacy() -> impl Strategy<Value = (u32, u32, u32, String)> {
        (2015u32..2100, 1u32..=12, 0u32..1000)
            .prop_map(|(y, m, r)| (y, m, r, format!("v{:04}{:02}-{}", y, m, r)))
    }

    proptest! {
        #[test]
        fn legacy_comparison_is_reflexive((_, _, _, a) in legacy()) {
            prop_assert_eq!(compare_versions(&a, &a), Ok(Ordering::Equal));
        }

        #[test]
        fn legacy_comparison_is_antisymmetric((_, _, _, a) in legacy(), (_, _, _, b) in legacy()) {
            let ab = compare_versions(&a, &b).unwrap();
            let ba = compare_versions(&b, &a).unwrap();
            prop_assert_eq!(ab, ba.reverse());
        }

        #[test]
        fn legacy_comparison_is_transitive(
            (_, _, _, a) in legacy(),
            (_, _, _, b) in legacy(),
            (_, _, _, c) in legacy(),
        ) {
            let ab = compare_versions(&a, &b).unwrap();
            let bc = compare_versions(&b, &c).unwrap();
            if ab != Ordering::Greater && bc != Ordering::Greater {
                prop_assert_ne!(compare_versions(&a, &c).unwrap(), Ordering::Greater);
            }
        }

        #[test]
        fn legacy_order_follows_month_release_tuple((y1, m1, r1, a) in legacy(), (y2, m2, r2, b) in legacy()) {
            let expected = (y1 * 100 + m1, r1).cmp(&(y2 * 100 + m2, r2));
            prop_assert_eq!(compare_versions(&a, &b).unwrap(), expected);
        }

        #[test]
        fn no_string_matches_both_formats(s in "v?[0-9]{1,6}[.-]?[0-9]{0,3}[.-]?[0-9]{0,3}") {
            prop_assert!(!(matches_legacy(&s) && matches_modern(&s)));
        }

        #[test]
        fn arbitrary_strings_match_at_most_one_format(s in ".{0,16}") {
            prop_assert!(!(matches_legacy(&s) && matches_modern(&s)));
        }

        #[test]
        fn classified_versions_compare_equal_to_themselves(
            s in "v?[0-9]{1,6}(\\.[0-9]{1,3}){0,2}(-[0-9a-z.]{0,4})?"
        ) {
            if classify(&s).is_some() {
                prop_assert_eq!(compare_versions(&s, &s), Ok(Ordering::Equal));
            } else {
                prop_assert!(compare_versions(&s, &s).is_err());
            }
        }
    }
}
