//! Kernel version record and version-code encoding.

use serde::Serialize;

use crate::error::{BridgeError, Result};

/// Version of the kernel source as reported to kernel-side code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelVersion {
    /// `<version name>.<build number>`, e.g. `1.2.3.45`.
    pub name: String,
    /// Numeric code, see [`get_version_code_from`].
    pub code: u64,
}

impl KernelVersion {
    pub fn new(version_name: &str, build_number: u32) -> Result<Self> {
        Ok(Self {
            name: format!("{version_name}.{build_number}"),
            code: get_version_code_from(version_name, build_number)?,
        })
    }
}

/// Computes the version code of an `x.y.z` version name.
///
/// Components are read as decimal digits, least-significant last, so the
/// result is `xyz000 + build_number`. `("1.2.3", 45)` gives `123045`.
///
/// Components of 10 or more are not rejected; they overlap the neighbouring
/// digit and are only reported with a warning.
pub fn get_version_code_from(name: &str, build_number: u32) -> Result<u64> {
    let mut code: u64 = 0;

    for (position, part) in name.split('.').rev().enumerate() {
        let digit: u64 = part.trim().parse().map_err(|_| {
            BridgeError::invalid_version(name, format!("component '{part}' is not a number"))
        })?;

        if digit > 9 {
            tracing::warn!(
                version = name,
                component = part,
                "Version component exceeds a single digit, version code will overlap"
            );
        }

        let weight = u32::try_from(position)
            .ok()
            .and_then(|p| 10u64.checked_pow(p))
            .ok_or_else(|| BridgeError::invalid_version(name, "too many components"))?;

        code = weight
            .checked_mul(digit)
            .and_then(|v| code.checked_add(v))
            .ok_or_else(|| BridgeError::invalid_version(name, "version code overflow"))?;
    }

    code.checked_mul(1000)
        .and_then(|v| v.checked_add(u64::from(build_number)))
        .ok_or_else(|| BridgeError::invalid_version(name, "version code overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_code_example() {
        assert_eq!(get_version_code_from("1.2.3", 45).unwrap(), 123045);
    }

    #[test]
    fn version_code_matches_digit_formula() {
        for x in 0..10u64 {
            for (y, z, build) in [(0u64, 0u64, 0u32), (4, 7, 1), (9, 9, 999)] {
                let name = format!("{x}.{y}.{z}");
                let expected = (x * 100 + y * 10 + z) * 1000 + u64::from(build);
                assert_eq!(get_version_code_from(&name, build).unwrap(), expected);
            }
        }
    }

    #[test]
    fn version_code_build_number_can_exceed_three_digits() {
        assert_eq!(get_version_code_from("0.0.1", 1500).unwrap(), 2500);
    }

    #[test]
    fn version_code_keeps_wide_components() {
        // 1*100 + 20*10 + 3
        assert_eq!(get_version_code_from("1.20.3", 0).unwrap(), 303_000);
    }

    #[test]
    fn version_code_rejects_non_numeric_component() {
        let err = get_version_code_from("1.x.3", 0).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidVersion { .. }));
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn version_code_rejects_negative_component() {
        assert!(get_version_code_from("1.-2.3", 0).is_err());
    }

    #[test]
    fn version_code_rejects_empty_name() {
        assert!(get_version_code_from("", 0).is_err());
    }

    #[test]
    fn kernel_version_name_includes_build() {
        let version = KernelVersion::new("2.0.1", 17).unwrap();
        assert_eq!(version.name, "2.0.1.17");
        assert_eq!(version.code, 201_017);
    }

    #[test]
    fn kernel_version_serializes() {
        let version = KernelVersion::new("1.2.3", 45).unwrap();
        insta::assert_json_snapshot!(version, @r#"
        {
          "name": "1.2.3.45",
          "code": 123045
        }
        "#);
    }
}
