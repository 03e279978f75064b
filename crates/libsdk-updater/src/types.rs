// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::Serialize;

use crate::{Package, PlanEntry, UpdatePlan};

/// result of an update check, including sources that could not be loaded.
#[derive(Debug, Clone, Default)]
pub struct CheckResult {
    pub plan: UpdatePlan,
    pub failed_sources: Vec<SourceFailure>,
}

impl CheckResult {
    pub fn new(plan: UpdatePlan) -> Self {
        Self {
            plan,
            failed_sources: Vec::new(),
        }
    }

    pub fn has_blocked(&self) -> bool {
        self.plan.has_blocked()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub url: String,
    pub reason: String,
}

/// json view of a [`CheckResult`].
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub entries: Vec<PlanEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_sources: Vec<SourceFailure>,
}

impl From<&CheckResult> for PlanSummary {
    fn from(result: &CheckResult) -> Self {
        Self {
            entries: result.plan.entries(),
            missing: result
                .plan
                .missing()
                .into_iter()
                .map(|m| m.short_description())
                .collect(),
            failed_sources: result.failed_sources.clone(),
        }
    }
}

/// one package, flattened for listings.
#[derive(Debug, Clone, Serialize)]
pub struct PackageEntry {
    pub kind: String,
    pub description: String,
    pub revision: u32,
    pub obsolete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<&Package> for PackageEntry {
    fn from(package: &Package) -> Self {
        Self {
            kind: package.kind().to_string(),
            description: package.short_description(),
            revision: package.revision,
            obsolete: package.is_obsolete(),
            source: package
                .source_url
                .clone()
                .or_else(|| {
                    package
                        .archives
                        .first()
                        .and_then(|a| a.local_path.as_ref())
                        .map(|p| p.display().to_string())
                }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}
