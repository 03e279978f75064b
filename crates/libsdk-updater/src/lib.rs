// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Dependency resolution for Android SDK packages: given the installed SDK and a
// set of remote catalogs, works out which archives to install and in what order.

pub mod archive_info;
pub mod config;
pub mod error;
pub mod local;
pub mod package;
pub mod resolver;
pub mod sources;
pub mod types;
pub mod version;

use std::sync::Arc;

pub use archive_info::{ArchiveInfo, InfoId, InstallableArchive, PlanEntry, UpdatePlan};
pub use config::{Config, Verbosity, default_sdk_root};
pub use error::{Error, Result};
pub use local::{parse_properties, scan_local_sdk};
pub use package::{
    Arch, Archive, ArchiveRef, Host, Os, Package, PackageDetails, PackageKind, Requirement,
    UpdateInfo,
};
pub use resolver::{UpdaterLogic, suggestion_score};
pub use sources::{
    Catalog, CatalogSource, RepoSource, RepoSources, StaticSource, create_http_client,
};
pub use types::{CheckResult, JsonOutput, PackageEntry, PlanSummary, SourceFailure};
pub use version::AndroidVersion;

/// returns all installed packages under the configured sdk root.
pub fn list_installed(config: &Config) -> Result<Vec<Arc<Package>>> {
    scan_local_sdk(&config.sdk_root)
}

/// returns every remote package with an archive for the configured host.
pub fn list_remote(config: &Config) -> Result<(Vec<Arc<Package>>, Vec<SourceFailure>)> {
    let (sources, failures) = load_sources(config)?;

    let packages = sources
        .all_packages()
        .into_iter()
        .filter(|p| p.has_compatible_archive(&config.host))
        .filter(|p| config.include_obsoletes || !p.is_obsolete())
        .collect();

    Ok((packages, failures))
}

/// checks for updates to installed packages, and new packages if
/// [`Config::suggest_new`] is set.
pub fn check_updates(config: &Config) -> Result<CheckResult> {
    let local = list_installed(config)?;
    let (sources, failed_sources) = load_sources(config)?;
    let logic = UpdaterLogic::from_config(config);

    let mut plan = logic.compute_updates(None, &sources, &local);
    if config.suggest_new {
        logic.add_new_platforms(&mut plan, &sources, &local);
    }

    Ok(CheckResult {
        plan,
        failed_sources,
    })
}

/// resolves the install plan for the remote packages whose description contains
/// any of `filters`, ignoring case.
pub fn plan_for(config: &Config, filters: &[String]) -> Result<CheckResult> {
    let local = list_installed(config)?;
    let (sources, failed_sources) = load_sources(config)?;
    let logic = UpdaterLogic::from_config(config);

    let filters: Vec<String> = filters.iter().map(|f| f.to_lowercase()).collect();
    let matching: Vec<Arc<Package>> = sources
        .all_packages()
        .into_iter()
        .filter(|p| config.include_obsoletes || !p.is_obsolete())
        .filter(|p| p.has_compatible_archive(&config.host))
        .filter(|p| {
            let description = p.short_description().to_lowercase();
            filters.iter().any(|f| description.contains(f))
        })
        .collect();

    if matching.is_empty() {
        return Err(Error::other(format!(
            "no remote package matches {}",
            filters.join(", ")
        )));
    }

    // one pick per item, the newest revision wins
    let mut picks: Vec<Arc<Package>> = Vec::new();
    for candidate in matching {
        match picks.iter_mut().find(|p| p.same_item_as(&candidate)) {
            Some(pick) => {
                if pick.can_be_updated_by(&candidate) == UpdateInfo::Update {
                    *pick = candidate;
                }
            }
            None => picks.push(candidate),
        }
    }

    let selected: Vec<ArchiveRef> = picks
        .iter()
        .filter(|p| {
            let installed = local
                .iter()
                .any(|l| l.same_item_as(p) && l.can_be_updated_by(p) == UpdateInfo::NotUpdate);
            if installed {
                log::debug!("**plan:** '{p}' is already installed");
            }
            !installed
        })
        .filter_map(|p| ArchiveRef::first_compatible(p, &config.host))
        .collect();

    let plan = logic.compute_updates(Some(&selected), &sources, &local);
    Ok(CheckResult {
        plan,
        failed_sources,
    })
}

/// loads every configured catalog. sources that fail are reported, not fatal.
pub fn load_sources(config: &Config) -> Result<(RepoSources, Vec<SourceFailure>)> {
    if config.sources.is_empty() {
        return Err(Error::config("no catalog sources configured"));
    }

    let sources = RepoSources::from_urls(&config.sources)?;
    let failures = sources
        .load_all(config.force_http)
        .into_iter()
        .map(|(url, e)| SourceFailure {
            url,
            reason: e.to_string(),
        })
        .collect();

    Ok((sources, failures))
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use super::*;

    const CATALOG: &str = r#"{
        "packages": [
            { "kind": "platform_tool", "revision": 2, "archives": [ { "url": "pt2.zip" } ] },
            { "kind": "platform_tool", "revision": 3, "archives": [ { "url": "pt3.zip" } ] },
            { "kind": "tool", "revision": 8, "min_platform_tools_rev": 2,
              "archives": [ { "url": "t8.zip" } ] },
            { "kind": "tool", "revision": 9, "min_platform_tools_rev": 3,
              "archives": [ { "url": "t9.zip" } ] },
            { "kind": "platform", "revision": 1, "version": { "api_level": 9 },
              "version_name": "2.3", "min_tools_rev": 9,
              "archives": [ { "url": "p9.zip" } ] },
            { "kind": "platform", "revision": 1, "version": { "api_level": 10 },
              "obsolete": true, "archives": [ { "url": "p10.zip" } ] }
        ]
    }"#;

    fn write_props(root: &Path, rel: &str, content: &str) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("source.properties"), content).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let sdk = dir.path().join("sdk");
        write_props(&sdk, "tools", "Pkg.Revision=7\nPlatform.MinPlatformToolsRev=1\n");
        write_props(&sdk, "platform-tools", "Pkg.Revision=1\n");

        let catalog = dir.path().join("repository.json");
        fs::write(&catalog, CATALOG).unwrap();

        let config = Config::new()
            .with_sdk_root(sdk)
            .with_sources(vec![catalog.to_string_lossy().to_string()])
            .with_host(Host::new(Os::Linux, Arch::X86_64));
        (dir, config)
    }

    fn descriptions(result: &CheckResult) -> Vec<String> {
        result.plan.iter().map(ArchiveInfo::short_description).collect()
    }

    #[test]
    fn check_updates_end_to_end() {
        let (_dir, config) = fixture();

        let result = check_updates(&config).unwrap();
        assert!(result.failed_sources.is_empty());
        assert_eq!(
            descriptions(&result),
            ["Android SDK Platform-tools, revision 3", "Android SDK Tools, revision 9"]
        );

        let result = check_updates(&config.with_suggest_new(true)).unwrap();
        assert_eq!(
            descriptions(&result).last().map(String::as_str),
            Some("SDK Platform Android 2.3, API 9, revision 1")
        );
        assert_eq!(result.plan.len(), 3);
    }

    #[test]
    fn plan_for_matches_descriptions() {
        let (_dir, config) = fixture();

        let result = plan_for(&config, &["android 2.3".to_string()]).unwrap();
        assert_eq!(
            descriptions(&result),
            [
                "Android SDK Platform-tools, revision 3",
                "Android SDK Tools, revision 9",
                "SDK Platform Android 2.3, API 9, revision 1",
            ]
        );
        assert!(!result.has_blocked());

        let err = plan_for(&config, &["nothing".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn plan_for_keeps_newest_revision() {
        let (_dir, config) = fixture();

        let result = plan_for(&config, &["platform-tools".to_string()]).unwrap();
        assert_eq!(descriptions(&result), ["Android SDK Platform-tools, revision 3"]);
    }

    #[test]
    fn plan_for_skips_installed_packages() {
        let (dir, config) = fixture();
        let sdk = dir.path().join("sdk");
        write_props(&sdk, "platform-tools", "Pkg.Revision=3\n");

        let result = plan_for(&config, &["platform-tools".to_string()]).unwrap();
        assert!(result.plan.is_empty());

        let result = plan_for(&config, &["tools".to_string()]).unwrap();
        assert_eq!(descriptions(&result), ["Android SDK Tools, revision 9"]);
    }

    #[test]
    fn list_remote_skips_obsolete() {
        let (_dir, config) = fixture();

        let (packages, _) = list_remote(&config).unwrap();
        assert_eq!(packages.len(), 5);

        let (packages, _) = list_remote(&config.with_include_obsoletes(true)).unwrap();
        assert_eq!(packages.len(), 6);
    }

    #[test]
    fn unreadable_source_is_reported() {
        let (dir, config) = fixture();
        let missing = dir.path().join("missing.json").to_string_lossy().to_string();
        let mut sources = config.sources.clone();
        sources.push(missing.clone());

        let result = check_updates(&config.with_sources(sources)).unwrap();
        assert_eq!(result.failed_sources.len(), 1);
        assert_eq!(result.failed_sources[0].url, missing);
        assert_eq!(result.plan.len(), 2);
    }

    #[test]
    fn no_sources_is_a_config_error() {
        let (_dir, config) = fixture();
        let err = check_updates(&config.with_sources(Vec::new())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
