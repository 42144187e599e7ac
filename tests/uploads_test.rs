use lms_backend_rust::uploads::{UploadArea, UploadStore};

#[test]
fn provision_creates_the_full_tree() {
    let dir = tempfile::tempdir().unwrap();
    let store = UploadStore::new(dir.path().join("uploads"));

    store.provision().unwrap();

    for area in UploadArea::ALL {
        assert!(store.area_path(area).is_dir(), "{:?}", area);
    }
    assert!(store.is_provisioned());
}

#[test]
fn missing_area_fails_the_provision_check() {
    let dir = tempfile::tempdir().unwrap();
    let store = UploadStore::new(dir.path().join("uploads"));

    store.provision().unwrap();
    std::fs::remove_dir_all(store.area_path(UploadArea::Certificates)).unwrap();

    assert!(!store.is_provisioned());
}
