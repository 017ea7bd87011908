//! Turning shapefile groups into workflow file objects.

use crate::app::group::group_by_nameroot;
use crate::domain::model::{
    BundleOutput, BundledFile, FileClass, FileDescriptor, ShapefileBundle, ShapefileGroup,
};

/// Convert one group into a bundle with its sidecars attached.
///
/// Returns `None` for a group without a `.shp`.
pub fn to_bundle(group: &ShapefileGroup) -> Option<ShapefileBundle> {
    let primary = group.primary()?;

    Some(ShapefileBundle {
        file: BundledFile {
            class: FileClass::File,
            path: primary.path.clone(),
            basename: primary.basename.clone(),
            nameroot: primary.nameroot.clone(),
            nameext: primary.nameext.clone(),
            secondary_files: group.secondaries().cloned().collect(),
        },
    })
}

/// Group `files` into shapefile datasets and bundle each one.
pub fn bundle_shapefiles(files: &[FileDescriptor]) -> BundleOutput {
    let groups = group_by_nameroot(files);
    let bundles: Vec<ShapefileBundle> = groups.iter().filter_map(to_bundle).collect();

    tracing::debug!(
        files = files.len(),
        bundles = bundles.len(),
        "bundled shapefiles"
    );

    BundleOutput::from_bundles(bundles)
}
