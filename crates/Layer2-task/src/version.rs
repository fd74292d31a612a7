//! App version number source
//!
//! Reads `CFBundleShortVersionString` / `CFBundleVersion` from an XML
//! property list and writes a new `CFBundleVersion` back. Binary plists are
//! not supported.

use buildkit_foundation::{Error, Result};
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;

const SHORT_VERSION_KEY: &str = "CFBundleShortVersionString";
const BUILD_VERSION_KEY: &str = "CFBundleVersion";

/// App version as found in Info.plist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNumber {
    /// `CFBundleShortVersionString`, e.g. `1.4.0`
    pub short: String,

    /// `CFBundleVersion`, e.g. `212`
    pub build: String,

    /// Display form: `1.4.0 (212)`, or just `short` when the two agree
    pub full: String,
}

impl VersionNumber {
    pub fn new(short: impl Into<String>, build: impl Into<String>) -> Self {
        let short = short.into();
        let build = build.into();
        let full = if build.is_empty() || build == short {
            short.clone()
        } else if short.is_empty() {
            build.clone()
        } else {
            format!("{} ({})", short, build)
        };
        Self { short, build, full }
    }

    /// Same version with the last numeric component of the build bumped
    pub fn bump_build(&self) -> Result<VersionNumber> {
        if self.build.trim().is_empty() {
            return Ok(VersionNumber::new(self.short.clone(), "1"));
        }

        let (head, last) = match self.build.rsplit_once('.') {
            Some((head, last)) => (Some(head), last),
            None => (None, self.build.as_str()),
        };
        let next = last
            .parse::<u64>()
            .map_err(|_| Error::Version(format!("build number {:?} is not numeric", self.build)))?
            .checked_add(1)
            .ok_or_else(|| Error::Version(format!("build number {:?} is too large", self.build)))?;

        let build = match head {
            Some(head) => format!("{}.{}", head, next),
            None => next.to_string(),
        };
        Ok(VersionNumber::new(self.short.clone(), build))
    }
}

/// Where version numbers come from
pub trait VersionSource: Send + Sync {
    fn read(&self, plist: &Path) -> Result<VersionNumber>;

    fn write_build(&self, plist: &Path, build: &str) -> Result<()>;
}

/// [`VersionSource`] over XML property lists
#[derive(Debug, Clone, Copy, Default)]
pub struct PlistVersionSource;

impl PlistVersionSource {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(content: &str) -> Result<VersionNumber> {
        let short = string_value(content, SHORT_VERSION_KEY)?;
        let build = string_value(content, BUILD_VERSION_KEY)?;
        if short.is_none() && build.is_none() {
            return Err(Error::Version(format!(
                "neither {} nor {} found",
                SHORT_VERSION_KEY, BUILD_VERSION_KEY
            )));
        }
        Ok(VersionNumber::new(
            short.unwrap_or_default(),
            build.unwrap_or_default(),
        ))
    }

    /// Replace the `CFBundleVersion` string in `content`
    pub fn replace_build(content: &str, build: &str) -> Result<String> {
        let re = key_pattern(BUILD_VERSION_KEY)?;
        if !re.is_match(content) {
            return Err(Error::Version(format!("{} not found", BUILD_VERSION_KEY)));
        }
        let replaced = re.replace(content, |caps: &Captures| {
            format!("{}{}{}", &caps["open"], build, &caps["close"])
        });
        Ok(replaced.into_owned())
    }

    fn read_plist(plist: &Path) -> Result<String> {
        fs::read_to_string(plist).map_err(|e| {
            Error::Version(format!(
                "cannot read {} as an XML property list: {}",
                plist.display(),
                e
            ))
        })
    }
}

impl VersionSource for PlistVersionSource {
    fn read(&self, plist: &Path) -> Result<VersionNumber> {
        Self::parse(&Self::read_plist(plist)?)
    }

    fn write_build(&self, plist: &Path, build: &str) -> Result<()> {
        let content = Self::read_plist(plist)?;
        fs::write(plist, Self::replace_build(&content, build)?)?;
        Ok(())
    }
}

fn key_pattern(key: &str) -> Result<Regex> {
    let pattern = format!(
        r"(?P<open><key>{}</key>\s*<string>)(?P<value>[^<]*)(?P<close></string>)",
        regex::escape(key)
    );
    Regex::new(&pattern).map_err(|e| Error::Internal(e.to_string()))
}

fn string_value(content: &str, key: &str) -> Result<Option<String>> {
    Ok(key_pattern(key)?
        .captures(content)
        .map(|caps| caps["value"].trim().to_string()))
}
