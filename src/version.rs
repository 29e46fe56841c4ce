//! Semantic version normalization.
//!
//! Add-on sites publish loosely formatted version strings ("1.08", "5.3",
//! "v2"). This module coerces them into strict [`semver::Version`] values
//! so installed and latest versions compare under one total order.

use semver::Version;

use crate::addon::AddonError;

/// Normalizes a raw version string into a strict semantic version.
///
/// Leading zeros in numeric components are collapsed to minimal decimal
/// form, a leading `v` is accepted, and missing minor/patch components
/// fill with zero. An optional pre-release suffix after the first `-` is
/// passed through unchanged.
pub fn normalize(raw: &str) -> Result<Version, AddonError> {
    let malformed = || AddonError::MalformedVersion(raw.to_string());

    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

    let (core, pre_release) = match trimmed.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (trimmed, None),
    };

    if core.is_empty() {
        return Err(malformed());
    }

    let mut components = Vec::new();
    for component in core.split('.') {
        if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let stripped = component.trim_start_matches('0');
        components.push(if stripped.is_empty() { "0" } else { stripped });
    }

    if components.len() > 3 {
        return Err(malformed());
    }
    while components.len() < 3 {
        components.push("0");
    }

    let candidate = match pre_release {
        Some(pre) => format!("{}-{}", components.join("."), pre),
        None => components.join("."),
    };

    Version::parse(&candidate).map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zero_padding_is_stripped() {
        assert_eq!(normalize("1.02").unwrap(), normalize("1.2").unwrap());
        assert_eq!(normalize("03.004.05").unwrap(), Version::new(3, 4, 5));
        assert_eq!(normalize("00").unwrap(), Version::new(0, 0, 0));
    }

    #[test]
    fn test_missing_components_fill_with_zero() {
        assert_eq!(normalize("5").unwrap(), Version::new(5, 0, 0));
        assert_eq!(normalize("5.3").unwrap(), Version::new(5, 3, 0));
        assert_eq!(normalize("5.3.1").unwrap(), Version::new(5, 3, 1));
    }

    #[test]
    fn test_leading_v_is_accepted() {
        assert_eq!(normalize("v1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(normalize("V2").unwrap(), Version::new(2, 0, 0));
    }

    #[test]
    fn test_pre_release_passes_through() {
        let version = normalize("2.0-beta1").unwrap();
        assert_eq!(version.to_string(), "2.0.0-beta1");
        assert!(version < Version::new(2, 0, 0));
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(normalize(" 10.1 \n").unwrap(), Version::new(10, 1, 0));
    }

    #[test]
    fn test_malformed_inputs_are_rejected() {
        for raw in ["", " ", "abc", "1.a", "1..2", "1.2.3.4", "1,2", ".5", "5."] {
            let result = normalize(raw);
            assert!(
                matches!(result, Err(AddonError::MalformedVersion(_))),
                "{:?} should be rejected, got {:?}",
                raw,
                result
            );
        }
    }
}
