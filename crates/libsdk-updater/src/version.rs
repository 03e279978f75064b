// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// an android platform version: a stable api level, or a preview identified by codename.
///
/// previews carry the api level of the platform they build on; at equal api level a
/// preview ranks above the stable release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AndroidVersion {
    pub api_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
}

impl AndroidVersion {
    pub fn new(api_level: u32) -> Self {
        Self {
            api_level,
            codename: None,
        }
    }

    pub fn preview(api_level: u32, codename: impl Into<String>) -> Self {
        Self {
            api_level,
            codename: Some(codename.into()),
        }
    }

    pub fn is_preview(&self) -> bool {
        self.codename.is_some()
    }

    pub fn is_greater_or_equal_than(&self, api_level: u32) -> bool {
        self.api_level >= api_level
    }

    /// returns the codename for previews, the api level otherwise.
    pub fn api_string(&self) -> String {
        match &self.codename {
            Some(codename) => codename.clone(),
            None => self.api_level.to_string(),
        }
    }
}

/// versions are equal when both api level and codename match, so a preview never
/// equals a stable release.
impl PartialEq for AndroidVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AndroidVersion {}

impl Ord for AndroidVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.api_level
            .cmp(&other.api_level)
            .then_with(|| self.is_preview().cmp(&other.is_preview()))
            .then_with(|| self.codename.cmp(&other.codename))
    }
}

impl PartialOrd for AndroidVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AndroidVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.codename {
            Some(codename) => write!(f, "{}-{codename}", self.api_level),
            None => write!(f, "{}", self.api_level),
        }
    }
}

/// parses `"8"` or `"8-Honeycomb"`.
impl FromStr for AndroidVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (api, codename) = match s.split_once('-') {
            Some((api, codename)) => (api, Some(codename.trim())),
            None => (s, None),
        };

        let api_level = api
            .trim()
            .parse::<u32>()
            .map_err(|_| Error::InvalidVersion(s.to_string()))?;

        match codename {
            Some("") => Err(Error::InvalidVersion(s.to_string())),
            Some(codename) => Ok(Self::preview(api_level, codename)),
            None => Ok(Self::new(api_level)),
        }
    }
}
