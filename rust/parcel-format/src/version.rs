//! Writer identification (`created_by`) parsing.

use std::cmp::Ordering;

/// Application and semantic version of the library that wrote a file,
/// parsed from a `created_by` string such as `parquet-mr version 1.8.2 (build 4aba)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationVersion {
    pub application: String,
    pub build: Option<String>,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre_release: Option<String>,
}

impl ApplicationVersion {
    /// First `parquet-mr` release that writes correct column chunk lengths when
    /// a dictionary page is present.
    pub const CHUNK_LENGTH_FIXED: (&'static str, u32, u32, u32) = ("parquet-mr", 1, 2, 9);

    pub fn new(application: impl Into<String>, major: u32, minor: u32, patch: u32) -> Self {
        ApplicationVersion {
            application: application.into(),
            major,
            minor,
            patch,
            ..Default::default()
        }
    }

    /// Parses a `created_by` string.
    ///
    /// Missing or malformed version components parse as zero; the application name
    /// is everything before the ` version ` keyword (or the whole string).
    pub fn parse(created_by: &str) -> ApplicationVersion {
        let created_by = created_by.trim();
        let (application, rest) = match created_by.find(" version ") {
            Some(pos) => (&created_by[..pos], &created_by[pos + " version ".len()..]),
            None => {
                if !created_by.is_empty() {
                    log::debug!("created_by '{created_by}' carries no version");
                }
                (created_by, "")
            }
        };

        let mut tokens = rest.split_whitespace();
        let version = tokens.next().unwrap_or_default();
        let build = rest.find("(build ").map(|pos| {
            rest[pos + "(build ".len()..]
                .trim_end_matches(')')
                .trim()
                .to_string()
        });

        let (numbers, pre_release) = match version.split_once('-') {
            Some((numbers, pre)) => (numbers, Some(pre.to_string())),
            None => (version, None),
        };
        let mut parts = numbers.split('.').map(leading_number);
        ApplicationVersion {
            application: application.trim().to_string(),
            build,
            major: parts.next().unwrap_or(0),
            minor: parts.next().unwrap_or(0),
            patch: parts.next().unwrap_or(0),
            pre_release,
        }
    }

    /// Returns `true` if this is the same application and its version is strictly
    /// lower than `major.minor.patch`.
    pub fn version_lt(&self, application: &str, major: u32, minor: u32, patch: u32) -> bool {
        self.application == application
            && (self.major, self.minor, self.patch).cmp(&(major, minor, patch)) == Ordering::Less
    }

    /// Returns `true` if this writer under-reports column chunk lengths by the size
    /// of the dictionary page header.
    pub fn has_short_chunk_length(&self) -> bool {
        let (app, major, minor, patch) = Self::CHUNK_LENGTH_FIXED;
        self.version_lt(app, major, minor, patch)
    }
}

fn leading_number(s: &str) -> u32 {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}
