use crate::error::{ReleaseError, ReleaseErrorExt, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use toml::Value;
use tracing::debug;

pub const MANIFEST_FILE: &str = "Cargo.toml";

#[derive(Debug, Deserialize)]
struct ManifestFile {
    package: Option<PackageTable>,
    workspace: Option<WorkspaceTable>,
}

#[derive(Debug, Deserialize)]
struct PackageTable {
    name: String,
    version: Option<Value>,
    publish: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WorkspaceTable {
    #[serde(default)]
    package: WorkspacePackage,
}

/// `[workspace.package]` values members can inherit with `field.workspace = true`.
#[derive(Debug, Clone, Default, Deserialize)]
struct WorkspacePackage {
    version: Option<String>,
    publish: Option<Value>,
}

impl ManifestFile {
    fn inherits(&self) -> bool {
        self.package.as_ref().is_some_and(|p| {
            p.version.as_ref().is_some_and(is_inherited)
                || p.publish.as_ref().is_some_and(is_inherited)
        })
    }
}

/// The parts of a package manifest the publish driver cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: String,
    /// `None` when no version is declared or inherited.
    pub version: Option<String>,
    /// `false` for `publish = false` or an empty registry list, whether declared in the
    /// package or inherited from `[workspace.package]`.
    pub publishable: bool,
}

/// Reads `<dir>/Cargo.toml`, resolving `version` and `publish` inherited from the
/// enclosing workspace.
///
/// # Errors
/// Returns [`ReleaseError::Io`] when a manifest cannot be read, [`ReleaseError::Manifest`]
/// when one is not valid TOML and [`ReleaseError::InvalidConfiguration`] for a virtual
/// manifest or an inherited field with no workspace manifest above `dir`.
pub fn read_manifest(dir: &Path) -> Result<PackageManifest> {
    let path = dir.join(MANIFEST_FILE);
    let file = load(&path)?;

    let workspace = if file.inherits() { Some(find_workspace(dir, &file)?) } else { None };
    resolve(file, workspace.as_ref()).context(format!("Invalid manifest {}", path.display()))
}

/// Parses manifest text on its own.
///
/// Fields inherited from a workspace resolve against the `[workspace.package]` table of
/// the same text, if there is one; otherwise the version is unknown and the package counts
/// as publishable.
///
/// # Errors
/// See [`read_manifest`].
pub fn parse_manifest(content: &str) -> Result<PackageManifest> {
    let file: ManifestFile = toml::from_str(content)?;
    let workspace = file.workspace.as_ref().map(|w| w.package.clone());
    resolve(file, workspace.as_ref())
}

fn load(path: &Path) -> Result<ManifestFile> {
    let content = fs::read_to_string(path)
        .context(format!("Failed to read manifest {}", path.display()))?;
    toml::from_str(&content).context(format!("Invalid manifest {}", path.display()))
}

/// The `[workspace.package]` table of `file` itself or of the nearest ancestor manifest
/// declaring `[workspace]`.
fn find_workspace(dir: &Path, file: &ManifestFile) -> Result<WorkspacePackage> {
    if let Some(workspace) = &file.workspace {
        return Ok(workspace.package.clone());
    }

    for ancestor in dir.ancestors().skip(1) {
        let candidate = ancestor.join(MANIFEST_FILE);
        if !candidate.is_file() {
            continue;
        }
        if let Some(workspace) = load(&candidate)?.workspace {
            debug!(path = %candidate.display(), "Resolved workspace manifest");
            return Ok(workspace.package);
        }
    }

    Err(ReleaseError::InvalidConfiguration {
        message: format!(
            "package inherits fields from a workspace, but no workspace manifest was found \
             above {}",
            dir.display()
        )
        .into(),
        context: None,
    })
}

fn resolve(file: ManifestFile, workspace: Option<&WorkspacePackage>) -> Result<PackageManifest> {
    let package = file.package.ok_or_else(|| ReleaseError::InvalidConfiguration {
        message: "manifest has no [package] table".into(),
        context: None,
    })?;

    let version = match package.version {
        Some(Value::String(version)) => Some(version),
        Some(value) if is_inherited(&value) => workspace.and_then(|w| w.version.clone()),
        _ => None,
    };

    let publishable = match &package.publish {
        Some(value) if is_inherited(value) => {
            workspace.and_then(|w| w.publish.as_ref()).is_none_or(publish_flag)
        },
        Some(value) => publish_flag(value),
        None => true,
    };

    Ok(PackageManifest { name: package.name, version, publishable })
}

/// `field.workspace = true`
fn is_inherited(value: &Value) -> bool {
    value
        .as_table()
        .and_then(|t| t.get("workspace"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn publish_flag(value: &Value) -> bool {
    match value {
        Value::Boolean(flag) => *flag,
        Value::Array(registries) => !registries.is_empty(),
        _ => true,
    }
}
