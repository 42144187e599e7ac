use axum::Router;

pub async fn create_test_app() -> Router {
    let upload_root = tempfile::tempdir().expect("tempdir");
    std::env::set_var("DATABASE_URL", "");
    std::env::set_var("UPLOAD_ROOT", upload_root.path().join("uploads"));
    // Leak the tempdir so the upload tree outlives app construction.
    std::mem::forget(upload_root);

    lms_backend_rust::create_app().await
}
