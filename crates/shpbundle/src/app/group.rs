//! Grouping scattered shapefile members by nameroot.

use indexmap::IndexMap;

use crate::domain::model::{FileDescriptor, ShapefileGroup};

/// Partition `files` into per-dataset groups, keeping only groups with a `.shp`.
///
/// Groups come back in the order their nameroot was first seen. A file whose
/// extension matches no role still claims its nameroot's position but fills no
/// slot. When two files compete for the same slot the later one wins.
pub fn group_by_nameroot(files: &[FileDescriptor]) -> Vec<ShapefileGroup> {
    let mut groups: IndexMap<&str, ShapefileGroup> = IndexMap::new();

    for file in files {
        let key = file.nameroot.as_str();
        let group = groups
            .entry(key)
            .or_insert_with(|| ShapefileGroup::new(key));

        let Some(role) = file.role() else {
            tracing::debug!(basename = %file.basename, "ignoring file with no shapefile role");
            continue;
        };

        if let Some(previous) = group.assign(role, file.clone()) {
            tracing::debug!(
                nameroot = key,
                ?role,
                replaced = %previous.path,
                by = %file.path,
                "duplicate shapefile member, keeping the later file"
            );
        }
    }

    groups
        .into_values()
        .filter(|group| {
            let keep = group.primary().is_some();
            if !keep {
                tracing::trace!(nameroot = %group.nameroot, "dropping group without .shp");
            }
            keep
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ShapefileRole;

    fn roots(groups: &[ShapefileGroup]) -> Vec<&str> {
        groups.iter().map(|group| group.nameroot.as_str()).collect()
    }

    #[test]
    fn explicit_nameroot_groups_differing_basenames() {
        let files = vec![
            FileDescriptor::from_path("/out/layer_v1.shp").nameroot("layer"),
            FileDescriptor::from_path("/out/layer_final.dbf").nameroot("layer"),
        ];

        let groups = group_by_nameroot(&files);
        assert_eq!(roots(&groups), ["layer"]);
        assert_eq!(
            groups[0].get(ShapefileRole::Dbf).unwrap().basename,
            "layer_final.dbf"
        );
    }

    #[test]
    fn derived_key_strips_only_final_extension() {
        let files = vec![
            FileDescriptor::from_path("/out/foo.bar.shp"),
            FileDescriptor::from_path("/out/foo.bar.shx"),
        ];

        let groups = group_by_nameroot(&files);
        assert_eq!(roots(&groups), ["foo.bar"]);
        assert!(groups[0].get(ShapefileRole::Shx).is_some());
    }

    #[test]
    fn groups_without_primary_are_dropped() {
        let files = vec![
            FileDescriptor::from_path("/out/orphan.dbf"),
            FileDescriptor::from_path("/out/orphan.prj"),
        ];

        assert!(group_by_nameroot(&files).is_empty());
    }

    #[test]
    fn unrecognized_extensions_fill_no_slot() {
        let files = vec![
            FileDescriptor::from_path("/out/a.shp"),
            FileDescriptor::from_path("/out/a.shp.xml"),
            FileDescriptor::from_path("/out/a.SHX"),
        ];

        let groups = group_by_nameroot(&files);
        assert_eq!(roots(&groups), ["a"]);
        assert_eq!(groups[0].secondaries().count(), 0);
    }

    #[test]
    fn order_follows_first_sighting_of_each_nameroot() {
        let files = vec![
            FileDescriptor::from_path("/out/zeta.txt"),
            FileDescriptor::from_path("/out/alpha.shp"),
            FileDescriptor::from_path("/out/10.shp"),
            FileDescriptor::from_path("/out/zeta.shp"),
            FileDescriptor::from_path("/out/2.shp"),
        ];

        let groups = group_by_nameroot(&files);
        assert_eq!(roots(&groups), ["zeta", "alpha", "10", "2"]);
    }

    #[test]
    fn duplicate_role_keeps_the_later_file() {
        // Two primaries with one nameroot collapse silently; the last one wins.
        let files = vec![
            FileDescriptor::from_path("/run-1/roads.shp"),
            FileDescriptor::from_path("/run-2/roads.shp"),
        ];

        let groups = group_by_nameroot(&files);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].primary().unwrap().path, "/run-2/roads.shp");
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_by_nameroot(&[]).is_empty());
    }
}
