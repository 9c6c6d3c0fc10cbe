use chunk_upload_protocol::{
    AssemblyStrategy, HandlerRegistry, ProtocolError, ProtocolKind, RequestParts, TempUpload,
    UploadRequest,
};

fn upload(dir: &std::path::Path) -> TempUpload {
    TempUpload::from_body_in(dir, &[7u8; 64], "report.pdf").unwrap()
}

#[test]
fn dropzone_chunk_binds_with_parallel_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let file = upload(dir.path());
    let req = RequestParts::new("192.168.1.2")
        .with_header("User-Agent", "Mozilla/5.0")
        .with_param("dzuuid", "0b4f-11")
        .with_param("dzchunkindex", "2")
        .with_param("dztotalchunkcount", "4");

    let upload = HandlerRegistry::uploads().handler_for(&req, &file).unwrap();

    assert_eq!(upload.kind(), ProtocolKind::DropZone);
    assert_eq!(upload.kind().strategy(), AssemblyStrategy::Parallel);
    assert_eq!(upload.descriptor().current_index, 3);
    assert_eq!(upload.descriptor().chunk_size, 64);
    assert_eq!(upload.original_filename(), "report.pdf");
    assert_eq!(upload.percentage_done(), 75);
    assert_eq!(upload.identity().user_agent.as_deref(), Some("Mozilla/5.0"));
}

#[test]
fn plain_form_upload_falls_back_to_single() {
    let dir = tempfile::tempdir().unwrap();
    let file = upload(dir.path());
    let req = RequestParts::new("192.168.1.2").with_param("title", "quarterly");
    assert!(req.has_param("title"));

    let upload = HandlerRegistry::uploads().handler_for(&req, &file).unwrap();

    assert_eq!(upload.kind(), ProtocolKind::Single);
    assert!(upload.is_last_chunk());
    assert_eq!(upload.declared_size(), 64);
}

#[test]
fn descriptor_serialises_camel_case() {
    let dir = tempfile::tempdir().unwrap();
    let file = upload(dir.path());
    let req = RequestParts::new("10.0.0.9").with_header("Content-Range", "bytes 0-63/128");

    let upload = HandlerRegistry::uploads().handler_for(&req, &file).unwrap();
    let json = serde_json::to_value(upload.descriptor()).unwrap();

    assert_eq!(json["byteTotal"], 128);
    assert_eq!(json["uploadId"], "128");
    assert_eq!(json["originalFilename"], "report.pdf");
}

#[test]
fn check_registry_without_match_is_a_bad_request() {
    let err = HandlerRegistry::checks()
        .check_for(&RequestParts::new("10.0.0.9"))
        .unwrap_err();
    assert!(matches!(err, ProtocolError::ProtocolMismatch));
}
