//! Semantic version value with bump transitions.
//!
//! Only the SemVer core is understood: `MAJOR.MINOR.PATCH` without leading
//! zeros, optionally followed by `-PRERELEASE` made of alphanumerics, dots
//! and hyphens. Build metadata (`+...`) is rejected.
//!
//! Ordering compares `(major, minor, patch, prerelease)` with the prerelease
//! taken as a plain string (absent sorts as the empty string, so first).
//! This differs from full SemVer precedence: `1.0.0-rc.10` sorts before
//! `1.0.0-rc.2`, and `1.0.0` sorts before `1.0.0-alpha`.
use std::{cmp::Ordering, fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

static SEMVER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<major>0|[1-9]\d*)\.(?P<minor>0|[1-9]\d*)\.(?P<patch>0|[1-9]\d*)(?:-(?P<pre>[0-9A-Za-z.-]+))?$",
    )
    .expect("semver pattern is valid")
});

static PRERELEASE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z.-]+$").expect("prerelease pattern is valid"));

/// Which component a bump increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Major,
    Minor,
    Patch,
}

impl FromStr for Part {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Part::Major),
            "minor" => Ok(Part::Minor),
            "patch" => Ok(Part::Patch),
            other => Err(Error::InvalidPart(other.to_string())),
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Part::Major => "major",
            Part::Minor => "minor",
            Part::Patch => "patch",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    prerelease: Option<String>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// Replaces the prerelease label. An empty label clears it.
    ///
    /// Fails with [`Error::InvalidPrerelease`] when the label is outside the
    /// prerelease grammar.
    pub fn with_prerelease(mut self, prerelease: Option<&str>) -> Result<Self, Error> {
        let prerelease = prerelease.filter(|p| !p.is_empty());
        if let Some(pre) = prerelease {
            validate_prerelease(pre)?;
        }
        self.prerelease = prerelease.map(str::to_string);
        Ok(self)
    }

    /// Parses `text` (surrounding whitespace ignored) against the SemVer core
    /// grammar.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let invalid = || Error::VersionParse(text.to_string());
        let caps = SEMVER_PATTERN.captures(text.trim()).ok_or_else(invalid)?;
        let number = |name: &str| caps[name].parse::<u64>().map_err(|_| invalid());

        Ok(Self {
            major: number("major")?,
            minor: number("minor")?,
            patch: number("patch")?,
            prerelease: caps.name("pre").map(|m| m.as_str().to_string()),
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn prerelease(&self) -> Option<&str> {
        self.prerelease.as_deref()
    }

    /// Increments `part`, zeroing the lower components. The prerelease label
    /// is always replaced by `prerelease`, never carried over.
    ///
    /// Fails with [`Error::VersionOverflow`] when the component is already
    /// `u64::MAX`, and with [`Error::InvalidPrerelease`] for a bad label.
    pub fn bump(&self, part: Part, prerelease: Option<&str>) -> Result<Self, Error> {
        let overflow = || Error::VersionOverflow {
            version: self.to_string(),
            part,
        };
        let (major, minor, patch) = match part {
            Part::Major => (self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
            Part::Minor => (self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0),
            Part::Patch => (
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        };
        Self::new(major, minor, patch).with_prerelease(prerelease)
    }

    pub fn bump_major(&self, prerelease: Option<&str>) -> Result<Self, Error> {
        self.bump(Part::Major, prerelease)
    }

    pub fn bump_minor(&self, prerelease: Option<&str>) -> Result<Self, Error> {
        self.bump(Part::Minor, prerelease)
    }

    pub fn bump_patch(&self, prerelease: Option<&str>) -> Result<Self, Error> {
        self.bump(Part::Patch, prerelease)
    }

    fn sort_key(&self) -> (u64, u64, u64, &str) {
        (
            self.major,
            self.minor,
            self.patch,
            self.prerelease.as_deref().unwrap_or(""),
        )
    }
}

/// Checks a prerelease label against the grammar used by [`Version::parse`].
pub fn validate_prerelease(prerelease: &str) -> Result<(), Error> {
    if PRERELEASE_PATTERN.is_match(prerelease) {
        Ok(())
    } else {
        Err(Error::InvalidPrerelease(prerelease.to_string()))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_leading_zeros_and_build_metadata() {
        for text in ["01.2.3", "1.02.3", "1.2.03", "1.2.3+build", "1.2", "v1.2.3", "1.2.3-"] {
            assert!(Version::parse(text).is_err(), "{text} should be rejected");
        }
    }

    #[test]
    fn parse_trims_whitespace() {
        let version = Version::parse("  0.10.0-rc.1\n").expect("valid");
        assert_eq!(
            version,
            Version::new(0, 10, 0)
                .with_prerelease(Some("rc.1"))
                .expect("valid prerelease")
        );
    }

    #[test]
    fn overflowing_component_is_a_parse_error() {
        let err = Version::parse("99999999999999999999.0.0").expect_err("overflow");
        assert!(matches!(err, Error::VersionParse(_)));
    }

    #[test]
    fn bump_at_component_limit_is_an_error() {
        let version = Version::parse("18446744073709551615.0.0").expect("in grammar");
        let err = version.bump(Part::Major, None).expect_err("major overflows");
        assert!(matches!(err, Error::VersionOverflow { part: Part::Major, .. }));

        let version = Version::new(1, 0, u64::MAX);
        assert!(matches!(
            version.bump_patch(None),
            Err(Error::VersionOverflow { part: Part::Patch, .. })
        ));
        assert_eq!(version.bump_minor(None).expect("minor fits"), Version::new(1, 1, 0));
    }

    #[test]
    fn prerelease_outside_grammar_is_rejected() {
        let err = Version::new(1, 0, 0)
            .with_prerelease(Some("a b"))
            .expect_err("space is not allowed");
        assert!(matches!(err, Error::InvalidPrerelease(ref pre) if pre == "a b"));
        assert!(Version::new(1, 2, 3).bump(Part::Patch, Some("rc+1")).is_err());
        assert_eq!(
            Version::new(1, 0, 0).with_prerelease(Some("")).expect("empty clears"),
            Version::new(1, 0, 0)
        );
    }

    #[test]
    fn parse_error_carries_input() {
        let err = Version::parse("not-a-version").expect_err("invalid");
        assert_eq!(err.to_string(), "'not-a-version' is not valid SemVer.");
    }

    #[test]
    fn prerelease_compares_as_string() {
        let rc10 = Version::parse("1.0.0-rc.10").expect("valid");
        let rc2 = Version::parse("1.0.0-rc.2").expect("valid");
        assert!(rc10 < rc2);
        assert!(Version::new(1, 0, 0) < rc2);
    }

    #[test]
    fn part_from_str() {
        assert_eq!("minor".parse::<Part>().expect("valid"), Part::Minor);
        assert!(matches!("build".parse::<Part>(), Err(Error::InvalidPart(_))));
    }
}
