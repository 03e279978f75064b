// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{fmt, path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::AndroidVersion;

/// host operating systems an archive can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    #[default]
    Any,
    Linux,
    #[serde(rename = "macosx")]
    MacOsX,
    Windows,
}

impl Os {
    /// returns the os this binary was built for, if it is one archives can target.
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "linux" => Some(Self::Linux),
            "macos" => Some(Self::MacOsX),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }

    pub const fn ui_name(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Linux => "Linux",
            Self::MacOsX => "MacOS X",
            Self::Windows => "Windows",
        }
    }
}

/// host cpu architectures an archive can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    #[default]
    Any,
    Ppc,
    X86,
    X86_64,
}

impl Arch {
    pub fn current() -> Option<Self> {
        match std::env::consts::ARCH {
            "x86_64" => Some(Self::X86_64),
            "x86" => Some(Self::X86),
            "powerpc" | "powerpc64" => Some(Self::Ppc),
            _ => None,
        }
    }

    pub const fn ui_name(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Ppc => "PowerPC",
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
        }
    }
}

/// the machine archives are being resolved for. `None` means the host is not one
/// archives can target, in which case only `Any` archives are compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Host {
    pub os: Option<Os>,
    pub arch: Option<Arch>,
}

impl Host {
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self {
            os: Some(os),
            arch: Some(arch),
        }
    }

    pub fn current() -> Self {
        Self {
            os: Os::current(),
            arch: Arch::current(),
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::current()
    }
}

/// a downloadable artifact of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    #[serde(default)]
    pub os: Os,
    #[serde(default)]
    pub arch: Arch,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl Archive {
    pub fn new(os: Os, arch: Arch, url: impl Into<String>) -> Self {
        Self {
            os,
            arch,
            url: url.into(),
            ..Self::default()
        }
    }

    /// an archive installed at `path`, compatible with every host.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn is_local(&self) -> bool {
        self.local_path.is_some()
    }

    pub fn is_compatible(&self, host: &Host) -> bool {
        let os_ok = self.os == Os::Any || host.os == Some(self.os);
        let arch_ok = self.arch == Arch::Any || host.arch == Some(self.arch);
        os_ok && arch_ok
    }

    pub fn os_description(&self) -> String {
        match self.arch {
            Arch::Any => self.os.ui_name().to_string(),
            arch => format!("{} {}", self.os.ui_name(), arch.ui_name()),
        }
    }
}

/// package kinds, used for dispatch and for dependency ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageKind {
    PlatformTool,
    Tool,
    Platform,
    AddOn,
    Sample,
    Extra,
    Doc,
}

impl PackageKind {
    /// dependency rank. a package may only depend on kinds of strictly lower rank,
    /// which keeps the dependency graph acyclic.
    pub const fn rank(self) -> u8 {
        match self {
            Self::PlatformTool => 0,
            Self::Tool => 1,
            Self::Platform => 2,
            Self::AddOn | Self::Sample | Self::Extra | Self::Doc => 3,
        }
    }

    pub const fn all() -> &'static [PackageKind] {
        &[
            Self::PlatformTool,
            Self::Tool,
            Self::Platform,
            Self::AddOn,
            Self::Sample,
            Self::Extra,
            Self::Doc,
        ]
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlatformTool => write!(f, "Platform-tools"),
            Self::Tool => write!(f, "Tools"),
            Self::Platform => write!(f, "Platform"),
            Self::AddOn => write!(f, "Add-on"),
            Self::Sample => write!(f, "Samples"),
            Self::Extra => write!(f, "Extra"),
            Self::Doc => write!(f, "Documentation"),
        }
    }
}

/// kind specific attributes, including every dependency the kind can declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PackageDetails {
    PlatformTool,
    Tool {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_platform_tools_rev: Option<u32>,
    },
    Platform {
        version: AndroidVersion,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_tools_rev: Option<u32>,
    },
    AddOn {
        name: String,
        vendor: String,
        version: AndroidVersion,
    },
    Sample {
        version: AndroidVersion,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_tools_rev: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_api_level: Option<u32>,
    },
    Extra {
        #[serde(default)]
        vendor: String,
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_tools_rev: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_api_level: Option<u32>,
    },
    Doc {
        version: AndroidVersion,
    },
}

/// a dependency declared by a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// a platform of exactly this version.
    ExactPlatform(AndroidVersion),
    /// a tools package with at least this revision.
    MinTools(u32),
    /// a platform-tools package with at least this revision.
    MinPlatformTools(u32),
    /// a platform with at least this api level.
    MinApiLevel(u32),
}

impl Requirement {
    pub const fn target(&self) -> PackageKind {
        match self {
            Self::ExactPlatform(_) | Self::MinApiLevel(_) => PackageKind::Platform,
            Self::MinTools(_) => PackageKind::Tool,
            Self::MinPlatformTools(_) => PackageKind::PlatformTool,
        }
    }
}

/// result of [`Package::can_be_updated_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateInfo {
    /// the other package is a different item.
    Incompatible,
    /// same item, but not newer.
    NotUpdate,
    /// same item and newer.
    Update,
}

/// an installable sdk component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub revision: u32,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(flatten)]
    pub details: PackageDetails,
    #[serde(default)]
    pub archives: Vec<Archive>,
}

impl Package {
    pub fn new(revision: u32, details: PackageDetails) -> Self {
        Self {
            revision,
            obsolete: false,
            description: String::new(),
            source_url: None,
            details,
            archives: Vec::new(),
        }
    }

    pub fn with_archive(mut self, archive: Archive) -> Self {
        self.archives.push(archive);
        self
    }

    pub fn with_obsolete(mut self, obsolete: bool) -> Self {
        self.obsolete = obsolete;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn into_ref(self) -> Arc<Package> {
        Arc::new(self)
    }

    pub const fn kind(&self) -> PackageKind {
        match self.details {
            PackageDetails::PlatformTool => PackageKind::PlatformTool,
            PackageDetails::Tool { .. } => PackageKind::Tool,
            PackageDetails::Platform { .. } => PackageKind::Platform,
            PackageDetails::AddOn { .. } => PackageKind::AddOn,
            PackageDetails::Sample { .. } => PackageKind::Sample,
            PackageDetails::Extra { .. } => PackageKind::Extra,
            PackageDetails::Doc { .. } => PackageKind::Doc,
        }
    }

    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    /// the android version this package targets, for kinds that have one.
    pub fn version(&self) -> Option<&AndroidVersion> {
        match &self.details {
            PackageDetails::Platform { version, .. }
            | PackageDetails::AddOn { version, .. }
            | PackageDetails::Sample { version, .. }
            | PackageDetails::Doc { version } => Some(version),
            _ => None,
        }
    }

    /// the exact platform version an add-on is built against.
    pub fn platform_dependency(&self) -> Option<&AndroidVersion> {
        match &self.details {
            PackageDetails::AddOn { version, .. } => Some(version),
            _ => None,
        }
    }

    pub fn min_tools_revision(&self) -> Option<u32> {
        match self.details {
            PackageDetails::Platform { min_tools_rev, .. }
            | PackageDetails::Sample { min_tools_rev, .. }
            | PackageDetails::Extra { min_tools_rev, .. } => min_tools_rev,
            _ => None,
        }
    }

    pub fn min_platform_tools_revision(&self) -> Option<u32> {
        match self.details {
            PackageDetails::Tool {
                min_platform_tools_rev,
            } => min_platform_tools_rev,
            _ => None,
        }
    }

    pub fn min_api_level(&self) -> Option<u32> {
        match self.details {
            PackageDetails::Sample { min_api_level, .. }
            | PackageDetails::Extra { min_api_level, .. } => min_api_level,
            _ => None,
        }
    }

    pub fn extra_path(&self) -> Option<&str> {
        match &self.details {
            PackageDetails::Extra { path, .. } => Some(path),
            _ => None,
        }
    }

    /// identity of an extra in its `vendor-path` form, which also covers the
    /// legacy layout that only had a path.
    pub fn extra_key(&self) -> Option<String> {
        match &self.details {
            PackageDetails::Extra { vendor, path, .. } => {
                if vendor.is_empty() || path.starts_with(&format!("{vendor}-")) {
                    Some(path.clone())
                } else {
                    Some(format!("{vendor}-{path}"))
                }
            }
            _ => None,
        }
    }

    /// every dependency this package declares, in resolution order.
    pub fn requirements(&self) -> Vec<Requirement> {
        let mut requirements = Vec::new();

        if let Some(version) = self.platform_dependency() {
            requirements.push(Requirement::ExactPlatform(version.clone()));
        }
        if let Some(rev) = self.min_tools_revision() {
            requirements.push(Requirement::MinTools(rev));
        }
        if let Some(rev) = self.min_platform_tools_revision() {
            requirements.push(Requirement::MinPlatformTools(rev));
        }
        if let Some(api) = self.min_api_level() {
            requirements.push(Requirement::MinApiLevel(api));
        }

        requirements
    }

    pub fn has_compatible_archive(&self, host: &Host) -> bool {
        self.archives.iter().any(|a| a.is_compatible(host))
    }

    pub fn first_compatible_archive(&self, host: &Host) -> Option<usize> {
        self.archives.iter().position(|a| a.is_compatible(host))
    }

    /// returns true if both packages describe the same installable item,
    /// regardless of revision.
    pub fn same_item_as(&self, other: &Package) -> bool {
        match (&self.details, &other.details) {
            (PackageDetails::PlatformTool, PackageDetails::PlatformTool)
            | (PackageDetails::Tool { .. }, PackageDetails::Tool { .. })
            | (PackageDetails::Doc { .. }, PackageDetails::Doc { .. }) => true,
            (
                PackageDetails::Platform { version: a, .. },
                PackageDetails::Platform { version: b, .. },
            )
            | (
                PackageDetails::Sample { version: a, .. },
                PackageDetails::Sample { version: b, .. },
            ) => a == b,
            (
                PackageDetails::AddOn {
                    name: n1,
                    vendor: v1,
                    version: a,
                },
                PackageDetails::AddOn {
                    name: n2,
                    vendor: v2,
                    version: b,
                },
            ) => n1 == n2 && v1 == v2 && a == b,
            (
                PackageDetails::Extra {
                    vendor: v1,
                    path: p1,
                    ..
                },
                PackageDetails::Extra {
                    vendor: v2,
                    path: p2,
                    ..
                },
            ) => same_extra(v1, p1, v2, p2),
            _ => false,
        }
    }

    pub fn can_be_updated_by(&self, other: &Package) -> UpdateInfo {
        if !self.same_item_as(other) {
            return UpdateInfo::Incompatible;
        }

        // docs follow the platform they document; revisions only matter at equal versions
        if let (PackageDetails::Doc { version: mine }, PackageDetails::Doc { version: theirs }) =
            (&self.details, &other.details)
            && theirs != mine
        {
            return if theirs > mine {
                UpdateInfo::Update
            } else {
                UpdateInfo::NotUpdate
            };
        }

        if other.revision > self.revision {
            UpdateInfo::Update
        } else {
            UpdateInfo::NotUpdate
        }
    }

    pub fn short_description(&self) -> String {
        let rev = self.revision;
        let mut s = match &self.details {
            PackageDetails::PlatformTool => {
                format!("Android SDK Platform-tools, revision {rev}")
            }
            PackageDetails::Tool { .. } => format!("Android SDK Tools, revision {rev}"),
            PackageDetails::Platform {
                version,
                version_name,
                ..
            } => {
                let name = version_name
                    .clone()
                    .unwrap_or_else(|| format!("android-{}", version.api_string()));
                format!(
                    "SDK Platform Android {name}, API {}, revision {rev}",
                    version.api_level
                )
            }
            PackageDetails::AddOn {
                name,
                vendor,
                version,
            } => format!(
                "{name} by {vendor}, Android API {}, revision {rev}",
                version.api_string()
            ),
            PackageDetails::Sample { version, .. } => format!(
                "Samples for SDK API {}{}, revision {rev}",
                version.api_string(),
                preview_suffix(version)
            ),
            PackageDetails::Extra { vendor, path, .. } => {
                if vendor.is_empty() {
                    format!("{path} package, revision {rev}")
                } else {
                    format!("{path} package by {vendor}, revision {rev}")
                }
            }
            PackageDetails::Doc { version } => format!(
                "Documentation for Android SDK{}, API {}, revision {rev}",
                preview_suffix(version),
                version.api_level
            ),
        };

        if self.obsolete {
            s.push_str(" (Obsolete)");
        }
        s
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_description())
    }
}

fn preview_suffix(version: &AndroidVersion) -> &'static str {
    if version.is_preview() { " Preview" } else { "" }
}

/// extras match on vendor and path. older installs used a `vendor-path` directory
/// with no vendor, so that form matches too, on either side.
fn same_extra(v1: &str, p1: &str, v2: &str, p2: &str) -> bool {
    if !v1.is_empty() && p2 == format!("{v1}-{p1}") && (v2.is_empty() || v2 == v1) {
        return true;
    }
    if !v2.is_empty() && p1 == format!("{v2}-{p2}") && (v1.is_empty() || v1 == v2) {
        return true;
    }
    p1 == p2 && v1 == v2
}

/// handle on one archive of a shared package.
#[derive(Debug, Clone)]
pub struct ArchiveRef {
    package: Arc<Package>,
    index: usize,
}

impl ArchiveRef {
    pub fn new(package: Arc<Package>, index: usize) -> Option<Self> {
        (index < package.archives.len()).then_some(Self { package, index })
    }

    /// the first archive of `package` compatible with `host`.
    pub fn first_compatible(package: &Arc<Package>, host: &Host) -> Option<Self> {
        let index = package.first_compatible_archive(host)?;
        Some(Self {
            package: Arc::clone(package),
            index,
        })
    }

    pub fn package(&self) -> &Arc<Package> {
        &self.package
    }

    pub fn archive(&self) -> &Archive {
        &self.package.archives[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_compatible(&self, host: &Host) -> bool {
        self.archive().is_compatible(host)
    }

    /// true if both handles point at the very same archive of the same package value.
    pub fn same_archive(&self, other: &ArchiveRef) -> bool {
        Arc::ptr_eq(&self.package, &other.package) && self.index == other.index
    }
}

impl fmt::Display for ArchiveRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.package.short_description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(api: u32, rev: u32) -> Package {
        Package::new(
            rev,
            PackageDetails::Platform {
                version: AndroidVersion::new(api),
                version_name: None,
                min_tools_rev: None,
            },
        )
    }

    fn extra(vendor: &str, path: &str, rev: u32) -> Package {
        Package::new(
            rev,
            PackageDetails::Extra {
                vendor: vendor.to_string(),
                path: path.to_string(),
                min_tools_rev: None,
                min_api_level: None,
            },
        )
    }

    fn doc(api: u32, rev: u32) -> Package {
        Package::new(
            rev,
            PackageDetails::Doc {
                version: AndroidVersion::new(api),
            },
        )
    }

    #[test]
    fn any_archive_is_compatible_everywhere() {
        let archive = Archive::new(Os::Any, Arch::Any, "http://x/a.zip");
        assert!(archive.is_compatible(&Host::new(Os::Linux, Arch::X86_64)));
        assert!(archive.is_compatible(&Host { os: None, arch: None }));
    }

    #[test]
    fn os_specific_archive_needs_matching_host() {
        let archive = Archive::new(Os::Windows, Arch::Any, "http://x/a.zip");
        assert!(archive.is_compatible(&Host::new(Os::Windows, Arch::X86)));
        assert!(!archive.is_compatible(&Host::new(Os::Linux, Arch::X86)));
        assert!(!archive.is_compatible(&Host { os: None, arch: None }));

        let archive = Archive::new(Os::Linux, Arch::X86_64, "http://x/a.zip");
        assert!(!archive.is_compatible(&Host::new(Os::Linux, Arch::X86)));
    }

    #[test]
    fn platforms_are_same_item_by_version() {
        assert!(platform(8, 1).same_item_as(&platform(8, 3)));
        assert!(!platform(8, 1).same_item_as(&platform(9, 1)));
        assert!(!platform(8, 1).same_item_as(&doc(8, 1)));
    }

    #[test]
    fn update_requires_higher_revision() {
        assert_eq!(platform(8, 1).can_be_updated_by(&platform(8, 2)), UpdateInfo::Update);
        assert_eq!(platform(8, 2).can_be_updated_by(&platform(8, 2)), UpdateInfo::NotUpdate);
        assert_eq!(platform(8, 2).can_be_updated_by(&platform(8, 1)), UpdateInfo::NotUpdate);
        assert_eq!(
            platform(8, 1).can_be_updated_by(&platform(9, 5)),
            UpdateInfo::Incompatible
        );
    }

    #[test]
    fn newer_doc_api_is_an_update() {
        assert_eq!(doc(8, 3).can_be_updated_by(&doc(9, 1)), UpdateInfo::Update);
        assert_eq!(doc(9, 1).can_be_updated_by(&doc(8, 3)), UpdateInfo::NotUpdate);
    }

    #[test]
    fn older_doc_api_is_never_an_update() {
        assert_eq!(doc(9, 1).can_be_updated_by(&doc(9, 2)), UpdateInfo::Update);
        assert_eq!(doc(9, 2).can_be_updated_by(&doc(9, 2)), UpdateInfo::NotUpdate);
        assert_eq!(doc(9, 1).can_be_updated_by(&doc(8, 30)), UpdateInfo::NotUpdate);
    }

    #[test]
    fn extra_key_matches_legacy_layout() {
        let legacy = extra("", "google-usb_driver", 1).extra_key();
        assert_eq!(legacy.as_deref(), Some("google-usb_driver"));
        assert_eq!(extra("google", "usb_driver", 1).extra_key(), legacy);
        assert_eq!(extra("google", "google-usb_driver", 1).extra_key(), legacy);
        assert_eq!(doc(8, 1).extra_key(), None);
    }

    #[test]
    fn extras_accept_legacy_vendor_path() {
        assert!(extra("android", "compat", 1).same_item_as(&extra("android", "compat", 2)));
        assert!(extra("android", "compat", 1).same_item_as(&extra("", "android-compat", 1)));
        assert!(extra("", "android-compat", 1).same_item_as(&extra("android", "compat", 1)));
        assert!(!extra("android", "compat", 1).same_item_as(&extra("google", "compat", 1)));
        assert!(!extra("android", "compat", 1).same_item_as(&extra("android", "usb", 1)));
    }

    #[test]
    fn requirements_only_target_lower_ranks() {
        let packages = [
            Package::new(1, PackageDetails::PlatformTool),
            Package::new(
                1,
                PackageDetails::Tool {
                    min_platform_tools_rev: Some(1),
                },
            ),
            Package::new(
                1,
                PackageDetails::Platform {
                    version: AndroidVersion::new(8),
                    version_name: None,
                    min_tools_rev: Some(1),
                },
            ),
            Package::new(
                1,
                PackageDetails::AddOn {
                    name: "Google APIs".into(),
                    vendor: "Google Inc.".into(),
                    version: AndroidVersion::new(8),
                },
            ),
            Package::new(
                1,
                PackageDetails::Sample {
                    version: AndroidVersion::new(8),
                    min_tools_rev: Some(1),
                    min_api_level: Some(8),
                },
            ),
            Package::new(
                1,
                PackageDetails::Extra {
                    vendor: "android".into(),
                    path: "compat".into(),
                    min_tools_rev: Some(1),
                    min_api_level: Some(8),
                },
            ),
            doc(8, 1),
        ];

        for package in &packages {
            for requirement in package.requirements() {
                assert!(
                    requirement.target().rank() < package.kind().rank(),
                    "{} may not depend on {}",
                    package.kind(),
                    requirement.target()
                );
            }
        }
    }

    #[test]
    fn short_descriptions() {
        assert_eq!(
            platform(9, 1).short_description(),
            "SDK Platform Android android-9, API 9, revision 1"
        );
        assert_eq!(
            Package::new(3, PackageDetails::PlatformTool)
                .with_obsolete(true)
                .short_description(),
            "Android SDK Platform-tools, revision 3 (Obsolete)"
        );
        assert_eq!(
            extra("android", "compat", 2).short_description(),
            "compat package by android, revision 2"
        );
    }

    #[test]
    fn catalog_json_shape() {
        let json = r#"{
            "kind": "platform",
            "revision": 2,
            "version": { "api_level": 8 },
            "min_tools_rev": 7,
            "archives": [ { "os": "linux", "arch": "x86_64", "url": "http://x/p.zip" } ]
        }"#;

        let package: Package = serde_json::from_str(json).unwrap();
        assert_eq!(package.kind(), PackageKind::Platform);
        assert_eq!(package.revision, 2);
        assert_eq!(package.min_tools_revision(), Some(7));
        assert_eq!(package.archives[0].os, Os::Linux);
        assert_eq!(package.archives[0].arch, Arch::X86_64);
    }

    #[test]
    fn archive_ref_identity() {
        let package = platform(8, 1)
            .with_archive(Archive::new(Os::Any, Arch::Any, "a"))
            .into_ref();
        let a = ArchiveRef::new(Arc::clone(&package), 0).unwrap();
        let b = ArchiveRef::first_compatible(&package, &Host::current()).unwrap();
        assert!(a.same_archive(&b));
        assert!(ArchiveRef::new(package, 1).is_none());

        let copy = platform(8, 1)
            .with_archive(Archive::new(Os::Any, Arch::Any, "a"))
            .into_ref();
        assert!(!a.same_archive(&ArchiveRef::new(copy, 0).unwrap()));
    }
}
