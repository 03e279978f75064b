// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{AndroidVersion, Archive, Error, Package, PackageDetails, PackageKind, Result};

const SOURCE_PROPERTIES: &str = "source.properties";

const PKG_REVISION: &str = "Pkg.Revision";
const PKG_DESC: &str = "Pkg.Desc";
const PKG_OBSOLETE: &str = "Pkg.Obsolete";
const PKG_SOURCE_URL: &str = "Pkg.SourceUrl";
const API_LEVEL: &str = "AndroidVersion.ApiLevel";
const CODENAME: &str = "AndroidVersion.CodeName";
const PLATFORM_VERSION: &str = "Platform.Version";
const MIN_TOOLS_REV: &str = "Platform.MinToolsRev";
const MIN_PLATFORM_TOOLS_REV: &str = "Platform.MinPlatformToolsRev";
const ADDON_NAME: &str = "Addon.Name";
const ADDON_VENDOR: &str = "Addon.Vendor";
const SAMPLE_MIN_API: &str = "Sample.MinApiLevel";
const EXTRA_PATH: &str = "Extra.Path";
const EXTRA_VENDOR: &str = "Extra.Vendor";
const EXTRA_MIN_API: &str = "Extra.MinApiLevel";

/// scans an sdk root for installed packages. a missing root is an empty sdk.
pub fn scan_local_sdk(sdk_root: &Path) -> Result<Vec<Arc<Package>>> {
    if !sdk_root.is_dir() {
        log::debug!("**local:** sdk root {} does not exist", sdk_root.display());
        return Ok(Vec::new());
    }

    let mut scanner = Scanner::default();

    scanner.visit(&sdk_root.join("tools"), PackageKind::Tool, None);
    scanner.visit(&sdk_root.join("platform-tools"), PackageKind::PlatformTool, None);
    scanner.visit(&sdk_root.join("docs"), PackageKind::Doc, None);

    for (dir, kind) in [
        ("platforms", PackageKind::Platform),
        ("add-ons", PackageKind::AddOn),
        ("samples", PackageKind::Sample),
    ] {
        for child in subdirectories(&sdk_root.join(dir)) {
            scanner.visit(&child, kind, None);
        }
    }

    for child in subdirectories(&sdk_root.join("extras")) {
        if child.join(SOURCE_PROPERTIES).is_file() {
            scanner.visit(&child, PackageKind::Extra, None);
            continue;
        }

        let vendor = dir_name(&child);
        for nested in subdirectories(&child) {
            scanner.visit(&nested, PackageKind::Extra, vendor.as_deref());
        }
    }

    let mut packages = scanner.packages;
    packages.sort_by(|a, b| {
        a.kind()
            .rank()
            .cmp(&b.kind().rank())
            .then_with(|| a.short_description().cmp(&b.short_description()))
    });

    log::debug!("**local:** found {} installed package(s)", packages.len());
    Ok(packages.into_iter().map(Arc::new).collect())
}

#[derive(Default)]
struct Scanner {
    visited: HashSet<PathBuf>,
    packages: Vec<Package>,
}

impl Scanner {
    fn visit(&mut self, dir: &Path, kind: PackageKind, vendor_dir: Option<&str>) {
        let canonical = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        if !self.visited.insert(canonical) {
            return;
        }

        let path = dir.join(SOURCE_PROPERTIES);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return,
        };

        let props = parse_properties(&content);
        match package_from_properties(&props, kind, dir, vendor_dir) {
            Ok(package) => self.packages.push(package),
            Err(e) => log::warn!("**local:** skipping {}: {e}", dir.display()),
        }
    }
}

fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

/// parses a java `.properties` file: `key=value` or `key: value` lines with
/// `#` and `!` comments. backslash escapes in values are unescaped.
pub fn parse_properties(content: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();

    for line in content.lines() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let Some(split) = line.find(['=', ':']) else {
            continue;
        };
        let key = line[..split].trim();
        let value = unescape(line[split + 1..].trim());
        if !key.is_empty() {
            props.insert(key.to_string(), value);
        }
    }

    props
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

fn package_from_properties(
    props: &HashMap<String, String>,
    kind: PackageKind,
    dir: &Path,
    vendor_dir: Option<&str>,
) -> Result<Package> {
    let revision = props
        .get(PKG_REVISION)
        .and_then(|v| parse_revision(v))
        .ok_or_else(|| Error::invalid_properties(format!("missing or invalid {PKG_REVISION}")))?;

    let details = match kind {
        PackageKind::PlatformTool => PackageDetails::PlatformTool,
        PackageKind::Tool => PackageDetails::Tool {
            min_platform_tools_rev: get_u32(props, MIN_PLATFORM_TOOLS_REV),
        },
        PackageKind::Platform => PackageDetails::Platform {
            version: android_version(props)?,
            version_name: props.get(PLATFORM_VERSION).cloned(),
            min_tools_rev: get_u32(props, MIN_TOOLS_REV),
        },
        PackageKind::AddOn => PackageDetails::AddOn {
            name: required(props, ADDON_NAME)?,
            vendor: required(props, ADDON_VENDOR)?,
            version: android_version(props)?,
        },
        PackageKind::Sample => PackageDetails::Sample {
            version: android_version(props)?,
            min_tools_rev: get_u32(props, MIN_TOOLS_REV),
            min_api_level: get_u32(props, SAMPLE_MIN_API),
        },
        PackageKind::Extra => {
            let path = props
                .get(EXTRA_PATH)
                .cloned()
                .or_else(|| dir_name(dir))
                .ok_or_else(|| Error::invalid_properties(format!("missing {EXTRA_PATH}")))?;
            let vendor = props
                .get(EXTRA_VENDOR)
                .cloned()
                .or_else(|| vendor_dir.map(str::to_string))
                .unwrap_or_default();

            PackageDetails::Extra {
                vendor,
                path,
                min_tools_rev: get_u32(props, MIN_TOOLS_REV),
                min_api_level: get_u32(props, EXTRA_MIN_API),
            }
        }
        PackageKind::Doc => PackageDetails::Doc {
            version: android_version(props)?,
        },
    };

    let mut package = Package::new(revision, details)
        .with_archive(Archive::local(dir))
        .with_obsolete(props.get(PKG_OBSOLETE).is_some_and(|v| is_truthy(v)));
    if let Some(desc) = props.get(PKG_DESC) {
        package = package.with_description(desc.clone());
    }
    if let Some(url) = props.get(PKG_SOURCE_URL) {
        package = package.with_source_url(url.clone());
    }

    Ok(package)
}

/// accepts `20` as well as `20.0.3`, keeping the major revision.
fn parse_revision(value: &str) -> Option<u32> {
    value.trim().split('.').next()?.parse().ok()
}

fn get_u32(props: &HashMap<String, String>, key: &str) -> Option<u32> {
    props.get(key).and_then(|v| v.trim().parse().ok())
}

fn required(props: &HashMap<String, String>, key: &str) -> Result<String> {
    props
        .get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| Error::invalid_properties(format!("missing {key}")))
}

fn android_version(props: &HashMap<String, String>) -> Result<AndroidVersion> {
    let api = get_u32(props, API_LEVEL)
        .ok_or_else(|| Error::invalid_properties(format!("missing or invalid {API_LEVEL}")))?;

    Ok(match props.get(CODENAME).filter(|c| !c.is_empty()) {
        Some(codename) => AndroidVersion::preview(api, codename.clone()),
        None => AndroidVersion::new(api),
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_props(root: &Path, rel: &str, content: &str) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SOURCE_PROPERTIES), content).unwrap();
    }

    #[test]
    fn parse_properties_handles_comments_and_escapes() {
        let props = parse_properties(
            "# generated\n\
             ! also a comment\n\
             Pkg.Revision=7\n\
             Pkg.SourceUrl=https\\://dl.example.com/repository.xml\n\
             Pkg.Desc : Android SDK Tools\n",
        );

        assert_eq!(props.len(), 3);
        assert_eq!(props["Pkg.Revision"], "7");
        assert_eq!(props["Pkg.SourceUrl"], "https://dl.example.com/repository.xml");
        assert_eq!(props["Pkg.Desc"], "Android SDK Tools");
    }

    #[test]
    fn missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let packages = scan_local_sdk(&dir.path().join("nope")).unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn scans_standard_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        write_props(root, "tools", "Pkg.Revision=7\nPlatform.MinPlatformToolsRev=1\n");
        write_props(root, "platform-tools", "Pkg.Revision=1\n");
        write_props(
            root,
            "platforms/android-9",
            "Pkg.Revision=2\nAndroidVersion.ApiLevel=9\nPlatform.Version=2.3\nPlatform.MinToolsRev=7\n",
        );
        write_props(
            root,
            "add-ons/addon-google_apis-9",
            "Pkg.Revision=1\nAndroidVersion.ApiLevel=9\nAddon.Name=Google APIs\nAddon.Vendor=Google Inc.\n",
        );
        write_props(
            root,
            "samples/android-9",
            "Pkg.Revision=1\nAndroidVersion.ApiLevel=9\nSample.MinApiLevel=4\n",
        );
        write_props(
            root,
            "docs",
            "Pkg.Revision=1\nAndroidVersion.ApiLevel=10\nAndroidVersion.CodeName=Honeycomb\n",
        );

        let packages = scan_local_sdk(root).unwrap();
        let kinds: Vec<_> = packages.iter().map(|p| p.kind()).collect();
        assert_eq!(
            kinds,
            [
                PackageKind::PlatformTool,
                PackageKind::Tool,
                PackageKind::Platform,
                PackageKind::Doc,
                PackageKind::AddOn,
                PackageKind::Sample,
            ]
        );

        let tools = &packages[1];
        assert_eq!(tools.revision, 7);
        assert_eq!(tools.min_platform_tools_revision(), Some(1));
        assert!(tools.archives[0].is_local());

        let platform = &packages[2];
        assert_eq!(platform.short_description(), "SDK Platform Android 2.3, API 9, revision 2");
        assert_eq!(platform.min_tools_revision(), Some(7));

        assert!(packages[3].version().unwrap().is_preview());
        assert_eq!(packages[4].platform_dependency(), Some(&AndroidVersion::new(9)));
        assert_eq!(packages[5].min_api_level(), Some(4));
    }

    #[test]
    fn scans_vendor_and_legacy_extras() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        write_props(root, "extras/android/compat", "Pkg.Revision=3\nExtra.MinApiLevel=4\n");
        write_props(
            root,
            "extras/google-usb_driver",
            "Pkg.Revision=4\nPkg.Obsolete=true\n",
        );

        let packages = scan_local_sdk(root).unwrap();
        assert_eq!(packages.len(), 2);

        let compat = packages
            .iter()
            .find(|p| p.extra_path() == Some("compat"))
            .unwrap();
        assert_eq!(compat.min_api_level(), Some(4));
        assert!(matches!(&compat.details, PackageDetails::Extra { vendor, .. } if vendor == "android"));

        let legacy = packages
            .iter()
            .find(|p| p.extra_path() == Some("google-usb_driver"))
            .unwrap();
        assert!(legacy.is_obsolete());
    }

    #[test]
    fn invalid_packages_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        write_props(root, "tools", "Pkg.Desc=no revision\n");
        write_props(root, "platforms/android-8", "Pkg.Revision=1\n");
        write_props(root, "platform-tools", "Pkg.Revision=20.0.3\n");
        fs::create_dir_all(root.join("platforms/empty")).unwrap();

        let packages = scan_local_sdk(root).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].kind(), PackageKind::PlatformTool);
        assert_eq!(packages[0].revision, 20);
    }
}
