// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use serde::Serialize;

use crate::{AndroidVersion, ArchiveRef, Package};

/// index of an [`ArchiveInfo`] inside an [`UpdatePlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InfoId(usize);

impl InfoId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// an archive planned for installation.
#[derive(Debug, Clone)]
pub struct InstallableArchive {
    pub new_archive: ArchiveRef,
    pub replaced_archive: Option<ArchiveRef>,
    pub depends_on: Vec<InfoId>,
    pub dependency_for: Vec<InfoId>,
    /// staged to satisfy a dependency or as a suggestion, not selected directly.
    pub automated: bool,
    pub accepted: bool,
    pub rejected: bool,
}

/// a node of the update plan.
#[derive(Debug, Clone)]
pub enum ArchiveInfo {
    Installable(InstallableArchive),
    /// an archive already installed. always accepted, never rejected.
    Local { archive: ArchiveRef },
    /// no platform satisfies a dependency. always rejected.
    MissingPlatform { version: AndroidVersion },
    /// no tools package satisfies a dependency. always rejected.
    MissingTool { revision: u32 },
    /// no platform-tools package satisfies a dependency. always rejected.
    MissingPlatformTool { revision: u32 },
}

impl ArchiveInfo {
    pub(crate) fn installable(
        new_archive: ArchiveRef,
        replaced_archive: Option<ArchiveRef>,
        depends_on: Vec<InfoId>,
        automated: bool,
    ) -> Self {
        Self::Installable(InstallableArchive {
            new_archive,
            replaced_archive,
            depends_on,
            dependency_for: Vec::new(),
            automated,
            accepted: false,
            rejected: false,
        })
    }

    pub fn is_accepted(&self) -> bool {
        match self {
            Self::Installable(info) => info.accepted,
            Self::Local { .. } => true,
            Self::MissingPlatform { .. }
            | Self::MissingTool { .. }
            | Self::MissingPlatformTool { .. } => false,
        }
    }

    pub fn is_rejected(&self) -> bool {
        match self {
            Self::Installable(info) => info.rejected,
            Self::Local { .. } => false,
            Self::MissingPlatform { .. }
            | Self::MissingTool { .. }
            | Self::MissingPlatformTool { .. } => true,
        }
    }

    /// true for the sentinels standing in for an unsatisfiable dependency.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            Self::MissingPlatform { .. } | Self::MissingTool { .. } | Self::MissingPlatformTool { .. }
        )
    }

    /// sets the accepted state. fixed for local and missing nodes.
    pub fn set_accepted(&mut self, accepted: bool) {
        if let Self::Installable(info) = self {
            info.accepted = accepted;
        }
    }

    /// sets the rejected state. fixed for local and missing nodes.
    pub fn set_rejected(&mut self, rejected: bool) {
        if let Self::Installable(info) = self {
            info.rejected = rejected;
        }
    }

    pub fn new_archive(&self) -> Option<&ArchiveRef> {
        match self {
            Self::Installable(info) => Some(&info.new_archive),
            Self::Local { archive } => Some(archive),
            _ => None,
        }
    }

    /// the package of [`Self::new_archive`].
    pub fn package(&self) -> Option<&Package> {
        self.new_archive().map(|a| a.package().as_ref())
    }

    pub fn replaced_archive(&self) -> Option<&ArchiveRef> {
        match self {
            Self::Installable(info) => info.replaced_archive.as_ref(),
            _ => None,
        }
    }

    pub fn is_automated(&self) -> bool {
        matches!(self, Self::Installable(info) if info.automated)
    }

    pub fn depends_on(&self) -> &[InfoId] {
        match self {
            Self::Installable(info) => &info.depends_on,
            _ => &[],
        }
    }

    pub fn dependency_for(&self) -> &[InfoId] {
        match self {
            Self::Installable(info) => &info.dependency_for,
            _ => &[],
        }
    }

    pub fn short_description(&self) -> String {
        match self {
            Self::Installable(info) => info.new_archive.package().short_description(),
            Self::Local { archive } => archive.package().short_description(),
            Self::MissingPlatform { version } => format!(
                "Missing SDK Platform Android{}, API {}",
                if version.is_preview() { " Preview" } else { "" },
                version.api_level
            ),
            Self::MissingTool { revision } => {
                format!("Missing Android SDK Tools, revision {revision}")
            }
            Self::MissingPlatformTool { revision } => {
                format!("Missing Android SDK Platform-tools, revision {revision}")
            }
        }
    }
}

impl fmt::Display for ArchiveInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_description())
    }
}

/// the resolver output: every node created during resolution, and the ordered
/// list of installable nodes. dependencies are staged before their dependents.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlan {
    infos: Vec<ArchiveInfo>,
    staged: Vec<InfoId>,
}

impl UpdatePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// number of staged installable nodes.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// staged nodes in install order.
    pub fn ids(&self) -> &[InfoId] {
        &self.staged
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchiveInfo> + '_ {
        self.staged.iter().map(|&id| self.get(id))
    }

    /// ids are only valid for the plan that issued them.
    ///
    /// # Panics
    ///
    /// if `id` was issued by a larger plan.
    pub fn get(&self, id: InfoId) -> &ArchiveInfo {
        &self.infos[id.0]
    }

    /// like [`Self::get`], without panicking on a foreign id.
    pub fn try_get(&self, id: InfoId) -> Option<&ArchiveInfo> {
        self.infos.get(id.0)
    }

    /// # Panics
    ///
    /// if `id` was issued by a larger plan.
    pub fn get_mut(&mut self, id: InfoId) -> &mut ArchiveInfo {
        &mut self.infos[id.0]
    }

    pub fn dependencies(&self, id: InfoId) -> impl Iterator<Item = &ArchiveInfo> + '_ {
        self.get(id).depends_on().iter().map(|&d| self.get(d))
    }

    pub fn dependents(&self, id: InfoId) -> impl Iterator<Item = &ArchiveInfo> + '_ {
        self.get(id).dependency_for().iter().map(|&d| self.get(d))
    }

    /// the staged node for the same item as `package`, if any.
    pub fn find_same_item(&self, package: &Package) -> Option<InfoId> {
        self.staged.iter().copied().find(|&id| {
            self.get(id)
                .package()
                .is_some_and(|p| p.same_item_as(package))
        })
    }

    /// every missing-dependency sentinel referenced by a staged node.
    pub fn missing(&self) -> Vec<&ArchiveInfo> {
        let mut seen = Vec::new();
        for &id in &self.staged {
            for &dep in self.get(id).depends_on() {
                if self.get(dep).is_missing() && !seen.contains(&dep) {
                    seen.push(dep);
                }
            }
        }
        seen.into_iter().map(|id| self.get(id)).collect()
    }

    /// true if `id` or any of its transitive dependencies is rejected.
    pub fn is_blocked(&self, id: InfoId) -> bool {
        let mut stack = vec![id];
        let mut visited = Vec::new();

        while let Some(current) = stack.pop() {
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);

            let info = self.get(current);
            if info.is_rejected() {
                return true;
            }
            stack.extend_from_slice(info.depends_on());
        }

        false
    }

    /// accepts every staged node that is not blocked.
    pub fn accept_all(&mut self) {
        let unblocked: Vec<InfoId> = self
            .staged
            .iter()
            .copied()
            .filter(|&id| !self.is_blocked(id))
            .collect();

        for id in unblocked {
            self.get_mut(id).set_accepted(true);
        }
    }

    /// accepted, unblocked archives in install order.
    pub fn accepted_archives(&self) -> Vec<&ArchiveRef> {
        self.staged
            .iter()
            .copied()
            .filter(|&id| self.get(id).is_accepted() && !self.is_blocked(id))
            .filter_map(|id| self.get(id).new_archive())
            .collect()
    }

    pub fn has_blocked(&self) -> bool {
        self.staged.iter().any(|&id| self.is_blocked(id))
    }

    pub(crate) fn stage(&mut self, info: ArchiveInfo) -> InfoId {
        let id = self.push(info);
        self.staged.push(id);
        id
    }

    /// adds a node that is referenced by others but is not itself installed.
    pub(crate) fn push(&mut self, info: ArchiveInfo) -> InfoId {
        let id = InfoId(self.infos.len());
        self.infos.push(info);
        id
    }

    pub(crate) fn add_dependency_for(&mut self, dependency: InfoId, dependent: InfoId) {
        if let ArchiveInfo::Installable(info) = self.get_mut(dependency)
            && !info.dependency_for.contains(&dependent)
        {
            info.dependency_for.push(dependent);
        }
    }

    /// serializable view of the staged nodes.
    pub fn entries(&self) -> Vec<PlanEntry> {
        self.staged
            .iter()
            .map(|&id| {
                let info = self.get(id);
                PlanEntry {
                    description: info.short_description(),
                    url: info.new_archive().map(|a| a.archive().url.clone()),
                    replaces: info
                        .replaced_archive()
                        .map(|a| a.package().short_description()),
                    depends_on: self.dependencies(id).map(ArchiveInfo::short_description).collect(),
                    automated: info.is_automated(),
                    accepted: info.is_accepted(),
                    blocked: self.is_blocked(id),
                }
            })
            .collect()
    }
}

/// one staged node, flattened for json output.
#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaces: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    pub automated: bool,
    pub accepted: bool,
    pub blocked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arch, Archive, Os, PackageDetails};

    fn tool_archive(rev: u32) -> ArchiveRef {
        let package = Package::new(
            rev,
            PackageDetails::Tool {
                min_platform_tools_rev: None,
            },
        )
        .with_archive(Archive::new(Os::Any, Arch::Any, format!("tools_r{rev}.zip")))
        .into_ref();
        ArchiveRef::new(package, 0).unwrap()
    }

    #[test]
    fn local_and_missing_states_are_fixed() {
        let mut local = ArchiveInfo::Local {
            archive: tool_archive(1),
        };
        local.set_accepted(false);
        local.set_rejected(true);
        assert!(local.is_accepted());
        assert!(!local.is_rejected());

        let mut missing = ArchiveInfo::MissingTool { revision: 4 };
        missing.set_accepted(true);
        missing.set_rejected(false);
        assert!(!missing.is_accepted());
        assert!(missing.is_rejected());
        assert!(missing.new_archive().is_none());
    }

    #[test]
    fn installable_state_is_caller_driven() {
        let mut info = ArchiveInfo::installable(tool_archive(2), None, Vec::new(), false);
        assert!(!info.is_accepted());
        assert!(!info.is_rejected());
        info.set_accepted(true);
        assert!(info.is_accepted());
    }

    #[test]
    fn missing_descriptions() {
        assert_eq!(
            ArchiveInfo::MissingPlatform {
                version: AndroidVersion::new(8)
            }
            .short_description(),
            "Missing SDK Platform Android, API 8"
        );
        assert_eq!(
            ArchiveInfo::MissingPlatform {
                version: AndroidVersion::preview(10, "Honeycomb")
            }
            .short_description(),
            "Missing SDK Platform Android Preview, API 10"
        );
        assert_eq!(
            ArchiveInfo::MissingTool { revision: 9 }.short_description(),
            "Missing Android SDK Tools, revision 9"
        );
    }

    #[test]
    fn blocked_propagates_through_dependencies() {
        let mut plan = UpdatePlan::new();
        let missing = plan.push(ArchiveInfo::MissingPlatformTool { revision: 3 });
        let tools = plan.stage(ArchiveInfo::installable(tool_archive(9), None, vec![missing], false));
        let other = plan.stage(ArchiveInfo::installable(tool_archive(10), None, vec![tools], false));

        assert_eq!(plan.len(), 2);
        assert!(plan.is_blocked(tools));
        assert!(plan.is_blocked(other));
        assert_eq!(plan.missing().len(), 1);

        plan.accept_all();
        assert!(plan.accepted_archives().is_empty());
    }

    #[test]
    fn foreign_ids_are_rejected() {
        let mut other = UpdatePlan::new();
        other.stage(ArchiveInfo::installable(tool_archive(1), None, Vec::new(), false));
        let foreign = other.stage(ArchiveInfo::installable(tool_archive(2), None, Vec::new(), false));

        let mut plan = UpdatePlan::new();
        let own = plan.stage(ArchiveInfo::installable(tool_archive(3), None, Vec::new(), false));

        assert!(plan.try_get(own).is_some());
        assert!(plan.try_get(foreign).is_none());
    }

    #[test]
    fn accept_all_skips_blocked_nodes() {
        let mut plan = UpdatePlan::new();
        let ok = plan.stage(ArchiveInfo::installable(tool_archive(9), None, Vec::new(), false));
        let missing = plan.push(ArchiveInfo::MissingTool { revision: 20 });
        let blocked = plan.stage(ArchiveInfo::installable(tool_archive(10), None, vec![missing], false));

        plan.accept_all();
        assert!(plan.get(ok).is_accepted());
        assert!(!plan.get(blocked).is_accepted());
        assert_eq!(plan.accepted_archives().len(), 1);
        assert!(plan.has_blocked());
    }
}
