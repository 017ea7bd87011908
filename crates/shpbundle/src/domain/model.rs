//! Domain models for file descriptors, shapefile groups, and bundles.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::errors::DescriptorError;

static FINAL_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.[^/.]+$").expect("extension pattern is valid"));

/// Split a basename into its root and final extension (dot included).
///
/// Only the last `.xxx` suffix is stripped, so `foo.bar.shp` yields
/// `("foo.bar", ".shp")`. A trailing dot is not an extension.
pub fn split_extension(basename: &str) -> (&str, &str) {
    match FINAL_EXTENSION.find(basename) {
        Some(found) => basename.split_at(found.start()),
        None => (basename, ""),
    }
}

/// A file record handed over by the workflow engine.
///
/// `nameroot` and `nameext` are always populated: absent values are derived
/// from `basename` when the descriptor is built. Attributes this crate does not
/// interpret are kept in `extra`, in their original order, and written back out
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFileDescriptor")]
pub struct FileDescriptor {
    pub path: String,
    pub basename: String,
    pub nameroot: String,
    pub nameext: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileDescriptor {
    /// Build a descriptor from a path, deriving the remaining name fields.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let basename = basename_of(&path).to_owned();
        Self::with_names(path, basename, None, None)
    }

    /// Build a descriptor with an explicit basename and optional name parts.
    ///
    /// An empty `nameroot` counts as absent.
    pub fn with_names(
        path: impl Into<String>,
        basename: impl Into<String>,
        nameroot: Option<String>,
        nameext: Option<String>,
    ) -> Self {
        let basename = basename.into();
        let (derived_root, derived_ext) = split_extension(&basename);
        let nameroot = nameroot
            .filter(|root| !root.is_empty())
            .unwrap_or_else(|| derived_root.to_owned());
        let nameext = nameext.unwrap_or_else(|| derived_ext.to_owned());

        Self {
            path: path.into(),
            basename,
            nameroot,
            nameext,
            extra: Map::new(),
        }
    }

    /// Override the grouping key.
    pub fn nameroot(mut self, nameroot: impl Into<String>) -> Self {
        let nameroot = nameroot.into();
        if !nameroot.is_empty() {
            self.nameroot = nameroot;
        }
        self
    }

    /// Attach an attribute that is carried through untouched.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The shapefile role this file plays, judged by its basename.
    pub fn role(&self) -> Option<ShapefileRole> {
        ShapefileRole::from_basename(&self.basename)
    }
}

/// Local path of a `file://` location; other locations are used as-is.
fn path_from_location(location: &str) -> String {
    location
        .strip_prefix("file://")
        .unwrap_or(location)
        .to_owned()
}

fn basename_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Loosely-typed record as it arrives on the wire.
#[derive(Debug, Deserialize)]
struct RawFileDescriptor {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    basename: Option<String>,
    #[serde(default)]
    nameroot: Option<String>,
    #[serde(default)]
    nameext: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawFileDescriptor> for FileDescriptor {
    type Error = DescriptorError;

    fn try_from(raw: RawFileDescriptor) -> Result<Self, Self::Error> {
        let path = raw
            .path
            .or_else(|| {
                raw.extra
                    .get("location")
                    .and_then(Value::as_str)
                    .map(path_from_location)
            })
            .ok_or(DescriptorError::MissingPath)?;
        let basename = raw
            .basename
            .unwrap_or_else(|| basename_of(&path).to_owned());

        let mut descriptor = Self::with_names(path, basename, raw.nameroot, raw.nameext);
        descriptor.extra = raw.extra;
        Ok(descriptor)
    }
}

/// Slot a file occupies within a shapefile dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapefileRole {
    /// Geometry, the primary file.
    Shp,
    /// Shape index.
    Shx,
    /// Attribute table.
    Dbf,
    /// Projection definition.
    Prj,
    /// Code page of the attribute table.
    Cpg,
    /// QGIS projection definition.
    Qpj,
}

impl ShapefileRole {
    /// Every role, primary first.
    pub const ALL: [ShapefileRole; 6] = [
        ShapefileRole::Shp,
        ShapefileRole::Shx,
        ShapefileRole::Dbf,
        ShapefileRole::Prj,
        ShapefileRole::Cpg,
        ShapefileRole::Qpj,
    ];

    /// Sidecar roles in the order they appear in `secondaryFiles`.
    pub const SECONDARY: [ShapefileRole; 5] = [
        ShapefileRole::Shx,
        ShapefileRole::Dbf,
        ShapefileRole::Prj,
        ShapefileRole::Cpg,
        ShapefileRole::Qpj,
    ];

    /// Basename suffix identifying the role.
    pub fn extension(&self) -> &'static str {
        match self {
            ShapefileRole::Shp => ".shp",
            ShapefileRole::Shx => ".shx",
            ShapefileRole::Dbf => ".dbf",
            ShapefileRole::Prj => ".prj",
            ShapefileRole::Cpg => ".cpg",
            ShapefileRole::Qpj => ".qpj",
        }
    }

    /// Match a basename against the role suffixes. Case-sensitive.
    pub fn from_basename(basename: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| basename.ends_with(role.extension()))
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

/// Files sharing one nameroot, at most one per role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapefileGroup {
    pub nameroot: String,
    slots: [Option<FileDescriptor>; 6],
}

impl ShapefileGroup {
    pub fn new(nameroot: impl Into<String>) -> Self {
        Self {
            nameroot: nameroot.into(),
            ..Default::default()
        }
    }

    /// Place a file in a role slot, returning whatever it replaced.
    pub fn assign(
        &mut self,
        role: ShapefileRole,
        descriptor: FileDescriptor,
    ) -> Option<FileDescriptor> {
        self.slots[role.slot()].replace(descriptor)
    }

    pub fn get(&self, role: ShapefileRole) -> Option<&FileDescriptor> {
        self.slots[role.slot()].as_ref()
    }

    /// The `.shp` file, if the group has one.
    pub fn primary(&self) -> Option<&FileDescriptor> {
        self.get(ShapefileRole::Shp)
    }

    /// Present sidecars in fixed role order.
    pub fn secondaries(&self) -> impl Iterator<Item = &FileDescriptor> {
        ShapefileRole::SECONDARY
            .into_iter()
            .filter_map(|role| self.get(role))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Class marker carried by workflow file objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileClass {
    #[default]
    File,
}

/// One shapefile dataset: the `.shp` with its sidecars attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapefileBundle {
    pub file: BundledFile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundledFile {
    pub class: FileClass,
    pub path: String,
    pub basename: String,
    pub nameroot: String,
    pub nameext: String,
    pub secondary_files: Vec<FileDescriptor>,
}

/// Result of bundling a file list.
///
/// A single dataset is returned bare; anything else, including nothing, is a
/// list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BundleOutput {
    Single(ShapefileBundle),
    Many(Vec<ShapefileBundle>),
}

impl BundleOutput {
    /// Apply the cardinality rule to a list of bundles.
    pub fn from_bundles(mut bundles: Vec<ShapefileBundle>) -> Self {
        if bundles.len() == 1
            && let Some(only) = bundles.pop()
        {
            return BundleOutput::Single(only);
        }
        BundleOutput::Many(bundles)
    }

    pub fn bundles(&self) -> &[ShapefileBundle] {
        match self {
            BundleOutput::Single(bundle) => std::slice::from_ref(bundle),
            BundleOutput::Many(bundles) => bundles,
        }
    }

    pub fn len(&self) -> usize {
        self.bundles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles().is_empty()
    }

    pub fn into_vec(self) -> Vec<ShapefileBundle> {
        match self {
            BundleOutput::Single(bundle) => vec![bundle],
            BundleOutput::Many(bundles) => bundles,
        }
    }
}
