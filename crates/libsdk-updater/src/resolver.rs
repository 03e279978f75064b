// SPDX-License-Identifier: MIT OR Apache-2.0

//! computes which archives to install for a selection or an update check,
//! adding the platforms and tools they depend on.

use std::{collections::HashMap, sync::Arc};

use crate::{
    AndroidVersion, ArchiveInfo, ArchiveRef, Config, Host, InfoId, Package, PackageKind,
    RepoSources, UpdateInfo, UpdatePlan, package::Requirement,
};

/// the dependency resolver.
#[derive(Debug, Clone)]
pub struct UpdaterLogic {
    host: Host,
    include_obsoletes: bool,
}

impl UpdaterLogic {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            include_obsoletes: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.host).with_include_obsoletes(config.include_obsoletes)
    }

    pub fn with_include_obsoletes(mut self, include_obsoletes: bool) -> Self {
        self.include_obsoletes = include_obsoletes;
        self
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// computes the archives to install for `selected`, plus everything they depend on.
    ///
    /// with no selection, every remote package that updates an installed one is selected.
    pub fn compute_updates(
        &self,
        selected: Option<&[ArchiveRef]>,
        sources: &RepoSources,
        local: &[Arc<Package>],
    ) -> UpdatePlan {
        let locals = self.create_local_archives(local);
        let mut remote = RemoteCatalog::new(sources, self.host);

        let found;
        let selected = match selected {
            Some(selected) => selected,
            None => {
                found = self.find_updates(&locals, &mut remote);
                &found[..]
            }
        };

        let mut plan = UpdatePlan::new();
        let mut pass = Resolution::new(self, &mut plan, Some(selected), &mut remote, &locals);
        for archive in selected {
            pass.insert_archive(archive, false);
        }

        log::debug!("**resolver:** {} archive(s) staged", plan.len());
        plan
    }

    /// adds suggestions for packages newer than anything of their kind installed:
    /// platforms, samples, add-ons, extras per identity, and the single best doc.
    pub fn add_new_platforms(
        &self,
        plan: &mut UpdatePlan,
        sources: &RepoSources,
        local: &[Arc<Package>],
    ) {
        let locals = self.create_local_archives(local);
        let installed = InstalledScores::from_packages(local);

        let mut remote = RemoteCatalog::new(sources, self.host);
        let remote_packages = remote.packages().to_vec();
        let mut pass = Resolution::new(self, plan, None, &mut remote, &locals);

        let mut doc_score = installed.doc;
        let mut suggested_doc = None;

        for package in &remote_packages {
            if package.is_obsolete() && !self.include_obsoletes {
                continue;
            }

            let score = suggestion_score(package);
            let should_add = match package.kind() {
                PackageKind::Platform => score > installed.platform,
                PackageKind::Sample => score > installed.sample,
                PackageKind::AddOn => score > installed.addon,
                PackageKind::Extra => package
                    .extra_key()
                    .and_then(|key| installed.extras.get(&key).copied())
                    .is_none_or(|current| score > current),
                PackageKind::Doc => {
                    if score > doc_score {
                        doc_score = score;
                        suggested_doc = Some(Arc::clone(package));
                    }
                    false
                }
                PackageKind::Tool | PackageKind::PlatformTool => false,
            };

            if should_add && let Some(archive) = ArchiveRef::first_compatible(package, &self.host) {
                pass.insert_archive(&archive, true);
            }
        }

        if let Some(doc) = suggested_doc
            && let Some(archive) = ArchiveRef::first_compatible(&doc, &self.host)
        {
            pass.insert_archive(&archive, true);
        }
    }

    /// wraps the first compatible archive of every installed package.
    pub fn create_local_archives(&self, local: &[Arc<Package>]) -> Vec<ArchiveInfo> {
        local
            .iter()
            .filter_map(|p| ArchiveRef::first_compatible(p, &self.host))
            .map(|archive| ArchiveInfo::Local { archive })
            .collect()
    }

    /// for every installed package, the best remote archive that updates it.
    fn find_updates(&self, locals: &[ArchiveInfo], remote: &mut RemoteCatalog<'_>) -> Vec<ArchiveRef> {
        let remote_packages = remote.packages();
        let mut updates: Vec<ArchiveRef> = Vec::new();

        for local in locals.iter().filter_map(ArchiveInfo::package) {
            let mut best: Option<ArchiveRef> = None;

            for candidate in remote_packages {
                if candidate.is_obsolete() && !self.include_obsoletes {
                    continue;
                }
                if local.can_be_updated_by(candidate) != UpdateInfo::Update {
                    continue;
                }

                let newer = best
                    .as_ref()
                    .is_none_or(|b| b.package().can_be_updated_by(candidate) == UpdateInfo::Update);
                if newer && let Some(archive) = ArchiveRef::first_compatible(candidate, &self.host) {
                    best = Some(archive);
                }
            }

            if let Some(archive) = best
                && !updates.iter().any(|u| u.same_archive(&archive))
            {
                log::debug!("**resolver:** '{local}' can be updated by '{archive}'");
                updates.push(archive);
            }
        }

        updates
    }
}

/// `api * 10 + preview + revision / 100`: orders by api level, then previews above
/// stable, then revision, without a revision ever outranking an api level.
pub fn suggestion_score(package: &Package) -> f32 {
    let (api, preview) = package
        .version()
        .map_or((0, false), |v| (v.api_level, v.is_preview()));

    api as f32 * 10.0 + if preview { 1.0 } else { 0.0 } + package.revision as f32 / 100.0
}

#[derive(Debug, Default)]
struct InstalledScores {
    platform: f32,
    sample: f32,
    addon: f32,
    doc: f32,
    extras: HashMap<String, f32>,
}

impl InstalledScores {
    fn from_packages(local: &[Arc<Package>]) -> Self {
        let mut scores = Self::default();

        for package in local {
            let score = suggestion_score(package);
            match package.kind() {
                PackageKind::Platform => scores.platform = scores.platform.max(score),
                PackageKind::Sample => scores.sample = scores.sample.max(score),
                PackageKind::AddOn => scores.addon = scores.addon.max(score),
                PackageKind::Doc => scores.doc = scores.doc.max(score),
                PackageKind::Extra => {
                    if let Some(key) = package.extra_key() {
                        let entry = scores.extras.entry(key).or_insert(score);
                        *entry = entry.max(score);
                    }
                }
                PackageKind::Tool | PackageKind::PlatformTool => {}
            }
        }

        scores
    }
}

/// remote packages, read from the sources at most once per resolution and
/// filtered to those with an archive for the host.
pub(crate) struct RemoteCatalog<'s> {
    sources: &'s RepoSources,
    host: Host,
    packages: Option<Vec<Arc<Package>>>,
}

impl<'s> RemoteCatalog<'s> {
    pub(crate) fn new(sources: &'s RepoSources, host: Host) -> Self {
        Self {
            sources,
            host,
            packages: None,
        }
    }

    pub(crate) fn packages(&mut self) -> &[Arc<Package>] {
        let sources = self.sources;
        let host = self.host;

        self.packages.get_or_insert_with(|| {
            let packages: Vec<Arc<Package>> = sources
                .sources()
                .iter()
                .filter_map(|s| s.packages())
                .flatten()
                .filter(|p| p.has_compatible_archive(&host))
                .collect();
            log::debug!("**resolver:** {} compatible remote package(s)", packages.len());
            packages
        })
    }
}

/// state of one top-level resolution: the plan being built, the caller's
/// selection, the remote cache and the installed archives.
pub(crate) struct Resolution<'a, 's> {
    host: Host,
    plan: &'a mut UpdatePlan,
    selected: Option<&'a [ArchiveRef]>,
    remote: &'a mut RemoteCatalog<'s>,
    locals: &'a [ArchiveInfo],
}

impl<'a, 's> Resolution<'a, 's> {
    pub(crate) fn new(
        logic: &UpdaterLogic,
        plan: &'a mut UpdatePlan,
        selected: Option<&'a [ArchiveRef]>,
        remote: &'a mut RemoteCatalog<'s>,
        locals: &'a [ArchiveInfo],
    ) -> Self {
        Self {
            host: logic.host,
            plan,
            selected,
            remote,
            locals,
        }
    }

    /// stages `archive` and its dependencies. returns the existing node if the
    /// same item is already staged.
    pub(crate) fn insert_archive(&mut self, archive: &ArchiveRef, automated: bool) -> InfoId {
        let package = Arc::clone(archive.package());

        if let Some(existing) = self.plan.find_same_item(&package) {
            return existing;
        }

        let replaced = self
            .locals
            .iter()
            .filter_map(ArchiveInfo::new_archive)
            .find(|local| local.package().can_be_updated_by(&package) == UpdateInfo::Update)
            .cloned();

        let depends_on = self.find_dependency(&package);

        let id = self.plan.stage(ArchiveInfo::installable(
            archive.clone(),
            replaced,
            depends_on.clone(),
            automated,
        ));
        for dependency in depends_on {
            self.plan.add_dependency_for(dependency, id);
        }

        log::debug!("**resolver:** staged '{package}'");
        id
    }

    /// resolves every dependency `package` declares. dependencies already
    /// satisfied by installed packages are left out.
    pub(crate) fn find_dependency(&mut self, package: &Package) -> Vec<InfoId> {
        package
            .requirements()
            .into_iter()
            .filter_map(|requirement| match requirement {
                Requirement::ExactPlatform(version) => self.find_platform_dependency(&version),
                Requirement::MinTools(rev) => self.find_tools_dependency(rev),
                Requirement::MinPlatformTools(rev) => self.find_platform_tools_dependency(rev),
                Requirement::MinApiLevel(api) => self.find_min_api_level_dependency(api),
            })
            .collect()
    }

    /// a platform of exactly `version`, as add-ons require.
    pub(crate) fn find_platform_dependency(&mut self, version: &AndroidVersion) -> Option<InfoId> {
        self.find_first(
            |p| p.kind() == PackageKind::Platform && p.version() == Some(version),
            ArchiveInfo::MissingPlatform {
                version: version.clone(),
            },
        )
    }

    /// a tools package of at least `rev`.
    pub(crate) fn find_tools_dependency(&mut self, rev: u32) -> Option<InfoId> {
        self.find_first(
            |p| p.kind() == PackageKind::Tool && p.revision >= rev,
            ArchiveInfo::MissingTool { revision: rev },
        )
    }

    /// a platform-tools package of at least `rev`.
    pub(crate) fn find_platform_tools_dependency(&mut self, rev: u32) -> Option<InfoId> {
        self.find_first(
            |p| p.kind() == PackageKind::PlatformTool && p.revision >= rev,
            ArchiveInfo::MissingPlatformTool { revision: rev },
        )
    }

    /// a platform with api level `api` or higher. any installed match wins;
    /// otherwise the highest api level among staged archives, then among the
    /// selection and remote packages together.
    pub(crate) fn find_min_api_level_dependency(&mut self, api: u32) -> Option<InfoId> {
        let platform_api = |p: &Package| {
            (p.kind() == PackageKind::Platform)
                .then(|| p.version())
                .flatten()
                .filter(|v| v.is_greater_or_equal_than(api))
                .map(|v| v.api_level)
        };

        if self.local_packages().any(|p| platform_api(p).is_some()) {
            return None;
        }

        let mut best_staged: Option<(u32, InfoId)> = None;
        for &id in self.plan.ids() {
            if let Some(found) = self.plan.get(id).package().and_then(platform_api)
                && best_staged.is_none_or(|(best, _)| found > best)
            {
                best_staged = Some((found, id));
            }
        }
        if let Some((_, id)) = best_staged {
            return Some(id);
        }

        let mut best: Option<(u32, ArchiveRef)> = None;
        for archive in self.selected.unwrap_or_default() {
            if let Some(found) = platform_api(archive.package())
                && best.as_ref().is_none_or(|(b, _)| found > *b)
            {
                best = Some((found, archive.clone()));
            }
        }
        for package in self.remote.packages() {
            if let Some(found) = platform_api(package)
                && best.as_ref().is_none_or(|(b, _)| found > *b)
                && let Some(archive) = ArchiveRef::first_compatible(package, &self.host)
            {
                best = Some((found, archive));
            }
        }

        match best {
            Some((_, archive)) => Some(self.insert_archive(&archive, true)),
            None => {
                log::debug!("**resolver:** no platform with api >= {api}");
                Some(self.plan.push(ArchiveInfo::MissingPlatform {
                    version: AndroidVersion::new(api),
                }))
            }
        }
    }

    /// looks for a package matching `matches`: installed (nothing to add), staged,
    /// selected, then remote. records `missing` when nothing matches.
    fn find_first(
        &mut self,
        matches: impl Fn(&Package) -> bool,
        missing: ArchiveInfo,
    ) -> Option<InfoId> {
        if self.local_packages().any(|p| matches(p)) {
            return None;
        }

        if let Some(&id) = self
            .plan
            .ids()
            .iter()
            .find(|&&id| self.plan.get(id).package().is_some_and(&matches))
        {
            return Some(id);
        }

        let selected = self
            .selected
            .unwrap_or_default()
            .iter()
            .find(|a| matches(a.package()))
            .cloned();
        if let Some(archive) = selected {
            return Some(self.insert_archive(&archive, true));
        }

        let host = self.host;
        let remote = self
            .remote
            .packages()
            .iter()
            .filter(|p| matches(p))
            .find_map(|p| ArchiveRef::first_compatible(p, &host));
        if let Some(archive) = remote {
            return Some(self.insert_archive(&archive, true));
        }

        log::debug!("**resolver:** dependency unsatisfied: {missing}");
        Some(self.plan.push(missing))
    }

    fn local_packages(&self) -> impl Iterator<Item = &Package> + '_ {
        self.locals.iter().filter_map(ArchiveInfo::package)
    }
}
