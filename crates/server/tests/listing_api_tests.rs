//! Integration tests for listing shapes: folding, filtering, search, and
//! caller-scoped auth flags.

mod common;

use axum::http::StatusCode;
use common::TestServer;

#[tokio::test]
async fn single_child_chains_fold_into_one_entry() {
    let server = TestServer::new().await;
    server.write_file("a/b/c/file.txt", b"x");

    let (status, body) = server.get_json("/-/json/", None).await;
    assert_eq!(status, StatusCode::OK);

    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "a/b/c");
    assert_eq!(files[0]["path"], "a/b/c");
    assert_eq!(files[0]["type"], "dir");
    assert_eq!(files[0]["size"], -1);
}

#[tokio::test]
async fn denied_names_never_appear_in_listings() {
    let server = TestServer::new().await;
    server.write_file("x.secret", b"hidden");
    server.write_file("x.txt", b"visible");
    server.write_sidecar(
        "",
        r#"
accessTables:
  - regex: '\.secret$'
    allow: false
  - regex: '.*'
    allow: true
"#,
    );

    let (_, body) = server.get_json("/-/json/", None).await;
    let names: Vec<&str> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["name"].as_str())
        .collect();

    assert!(names.contains(&"x.txt"));
    assert!(!names.contains(&"x.secret"));
    // The sidecar itself is a dotfile with no matching deny rule, so it
    // remains visible alongside x.txt.
}

#[tokio::test]
async fn search_caps_results_at_fifty() {
    let server = TestServer::new().await;
    for i in 0..80 {
        server.write_file(&format!("bulk/item-{i:03}.log"), b"");
    }
    server.rebuild_index().await;

    let (status, body) = server.get_json("/-/json/?search=item", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"].as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn search_supports_negated_tokens() {
    let server = TestServer::new().await;
    server.write_file("docs/readme.md", b"");
    server.write_file("docs/notes.txt", b"");
    server.write_file("src/main.go", b"");
    server.rebuild_index().await;

    let (_, body) = server.get_json("/-/json/?search=docs+-notes", None).await;
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["path"], "docs/readme.md");
}

#[tokio::test]
async fn search_names_are_relative_to_the_request_path() {
    let server = TestServer::new().await;
    server.write_file("docs/deep/inner.txt", b"");
    server.write_file("docs2/outside.txt", b"");
    server.rebuild_index().await;

    let (_, body) = server.get_json("/-/json/docs?search=txt", None).await;
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "deep/inner.txt");
    assert_eq!(files[0]["path"], "docs/deep/inner.txt");
}

#[tokio::test]
async fn browse_endpoint_honors_search_parameter() {
    let server = TestServer::new().await;
    server.write_file("music/song.mp3", b"");
    server.write_file("music/cover.jpg", b"");
    server.rebuild_index().await;

    let (status, body) = server.get_json("/music?search=mp3", None).await;
    assert_eq!(status, StatusCode::OK);
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "song.mp3");
}

#[tokio::test]
async fn auth_flags_are_scoped_to_the_caller() {
    let server = TestServer::new().await;
    server.write_sidecar(
        "",
        "upload: false\ndelete: false\nusers:\n  - identity: bob@example.com\n    upload: true\n    delete: true\n",
    );

    let (_, body) = server.get_json("/-/json/", None).await;
    assert_eq!(body["auth"]["upload"], false);
    assert_eq!(body["auth"]["delete"], false);

    let (_, body) = server.get_json("/-/json/", Some("bob@example.com")).await;
    assert_eq!(body["auth"]["upload"], true);
    assert_eq!(body["auth"]["delete"], true);

    let (_, body) = server.get_json("/-/json/", Some("carol@example.com")).await;
    assert_eq!(body["auth"]["upload"], false);
}

#[tokio::test]
async fn listing_a_missing_directory_is_not_found() {
    let server = TestServer::new().await;

    let (status, body) = server.get_json("/-/json/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn search_results_ignore_stale_prefixes() {
    let server = TestServer::new().await;
    server.write_file("keep/file.txt", b"");
    server.rebuild_index().await;

    // Queries under a sibling that shares a name prefix stay empty.
    server.make_dir("keep2");
    let (status, body) = server.get_json("/-/json/keep2?search=file", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"].as_array().unwrap().len(), 0);
}
