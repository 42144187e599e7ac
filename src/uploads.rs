use std::io;
use std::path::{Path, PathBuf};

/// The upload areas the deployment provisions. Assignment and certificate
/// areas are part of the on-disk contract even though the service does not
/// write to them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadArea {
    ProfilePictures,
    CourseThumbnails,
    CourseMaterials,
    AssignmentFiles,
    AssignmentSubmissions,
    CertificateTemplates,
    Certificates,
}

impl UploadArea {
    pub const ALL: [UploadArea; 7] = [
        UploadArea::ProfilePictures,
        UploadArea::CourseThumbnails,
        UploadArea::CourseMaterials,
        UploadArea::AssignmentFiles,
        UploadArea::AssignmentSubmissions,
        UploadArea::CertificateTemplates,
        UploadArea::Certificates,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            UploadArea::ProfilePictures => "profile_pictures",
            UploadArea::CourseThumbnails => "course_thumbnails",
            UploadArea::CourseMaterials => "course_materials",
            UploadArea::AssignmentFiles => "assignment_files",
            UploadArea::AssignmentSubmissions => "assignment_submissions",
            UploadArea::CertificateTemplates => "certificate_templates",
            UploadArea::Certificates => "certificates",
        }
    }
}

/// Root of the static upload tree. Provisioned once at startup, before the
/// listener binds, and served read-only at `/uploads`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn area_path(&self, area: UploadArea) -> PathBuf {
        self.root.join(area.dir_name())
    }

    /// Creates the root and every area directory. Idempotent.
    pub fn provision(&self) -> io::Result<()> {
        for area in UploadArea::ALL {
            std::fs::create_dir_all(self.area_path(area))?;
        }
        Ok(())
    }

    pub fn is_provisioned(&self) -> bool {
        UploadArea::ALL
            .iter()
            .all(|area| self.area_path(*area).is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provision_creates_all_areas() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        assert!(!store.is_provisioned());
        store.provision().unwrap();
        assert!(store.is_provisioned());

        for name in [
            "profile_pictures",
            "course_thumbnails",
            "course_materials",
            "assignment_files",
            "assignment_submissions",
            "certificate_templates",
            "certificates",
        ] {
            assert!(dir.path().join("uploads").join(name).is_dir(), "{name}");
        }
    }

    #[test]
    fn provision_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        store.provision().unwrap();
        store.provision().unwrap();
        assert!(store.is_provisioned());
    }
}
