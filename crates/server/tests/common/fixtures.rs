//! Test data helpers.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

/// Boundary used by [`multipart_body`].
pub const TEST_BOUNDARY: &str = "shelf-test-boundary";

/// Build a multipart/form-data body with one `file` part per entry.
pub fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{TEST_BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{TEST_BOUNDARY}--\r\n").as_bytes());
    body
}

/// The content type matching [`multipart_body`].
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={TEST_BOUNDARY}")
}

/// Write a zip archive with the given (name, contents) members.
pub fn write_zip_file(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(std::fs::File::create(path).expect("create zip file"));
    let options = zip::write::FileOptions::<()>::default();
    for (name, bytes) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(bytes).expect("write zip entry");
    }
    writer.finish().expect("finish zip");
}
