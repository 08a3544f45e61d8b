mod support;

use serde_json::json;
use support::{paths, MockResponse, MockServer};
use tfdoctor::repository::{RepositoryBundle, RepositoryFetcher};
use tfdoctor::shared::{HttpClient, RemoteFetchError};

const TREE_PAGE_1: &str = "/api/v4/projects/group%2Finfra/repository/tree?ref=main&recursive=true&per_page=100&page=1";
const TREE_PAGE_2: &str = "/api/v4/projects/group%2Finfra/repository/tree?ref=main&recursive=true&per_page=100&page=2";

fn fetcher(server: &MockServer) -> RepositoryFetcher {
    RepositoryFetcher::new(
        HttpClient::default(),
        &format!("{}/api/v4", server.base_url),
        "https://gitlab.com/",
        "glpat-secret".to_string(),
    )
}

fn raw_path(file: &str) -> String {
    format!(
        "/api/v4/projects/group%2Finfra/repository/files/{}/raw?ref=main",
        urlencoding::encode(file)
    )
}

#[test]
fn bundle_includes_only_terraform_blobs_in_listing_order() {
    let server = MockServer::start(|_, path| {
        if path == TREE_PAGE_1 {
            return MockResponse::json(
                json!([
                    {"id": "1", "name": "modules", "type": "tree", "path": "modules"},
                    {"id": "2", "name": "main.tf", "type": "blob", "path": "main.tf"},
                    {"id": "3", "name": "main.py", "type": "blob", "path": "main.py"},
                    {"id": "4", "name": "prod.tfvars", "type": "blob", "path": "env/prod.tfvars"},
                ])
                .to_string(),
            );
        }
        if path == raw_path("main.tf") {
            return MockResponse::text("resource \"aws_s3_bucket\" \"logs\" {}");
        }
        if path == raw_path("env/prod.tfvars") {
            return MockResponse::text("region = \"us-east-1\"");
        }
        MockResponse::status(404)
    });

    let bundle = fetcher(&server)
        .fetch_bundle("https://gitlab.com/group/infra/", "main")
        .expect("fetch bundle");
    assert_eq!(bundle.paths().collect::<Vec<_>>(), vec!["main.tf", "env/prod.tfvars"]);
    assert_eq!(
        bundle.render(),
        "File: main.tf\nresource \"aws_s3_bucket\" \"logs\" {}\n\nFile: env/prod.tfvars\nregion = \"us-east-1\"\n\n"
    );

    let requests = server.finish();
    assert!(!paths(&requests).iter().any(|p| p.contains("main.py")));
    assert!(requests
        .iter()
        .all(|r| r.auth_header == "Bearer glpat-secret"));
}

#[test]
fn latin1_file_is_bundled_with_replacement_characters() {
    let server = MockServer::start(|_, path| {
        if path == TREE_PAGE_1 {
            return MockResponse::json(
                json!([{"id": "1", "name": "main.tf", "type": "blob", "path": "main.tf"}]).to_string(),
            );
        }
        if path == raw_path("main.tf") {
            return MockResponse::bytes(b"# owner: Jos\xe9\nterraform {}".to_vec());
        }
        MockResponse::status(404)
    });

    let bundle = fetcher(&server)
        .fetch_bundle("https://gitlab.com/group/infra", "main")
        .expect("fetch bundle");
    assert_eq!(
        bundle.render(),
        "File: main.tf\n# owner: Jos\u{fffd}\nterraform {}\n\n"
    );
}

#[test]
fn tree_listing_follows_next_page_header() {
    let server = MockServer::start(|_, path| {
        if path == TREE_PAGE_1 {
            return MockResponse::json(
                json!([{"type": "blob", "path": "a.tf"}]).to_string(),
            )
            .with_header("X-Next-Page", "2");
        }
        if path == TREE_PAGE_2 {
            return MockResponse::json(
                json!([{"type": "blob", "path": "b.tf"}]).to_string(),
            );
        }
        if path == raw_path("a.tf") || path == raw_path("b.tf") {
            return MockResponse::text("# file");
        }
        MockResponse::status(404)
    });

    let bundle = fetcher(&server)
        .fetch_bundle("https://gitlab.com/group/infra", "main")
        .expect("fetch bundle");
    assert_eq!(bundle.len(), 2);

    let requests = server.finish();
    assert_eq!(
        paths(&requests),
        vec![
            TREE_PAGE_1.to_string(),
            TREE_PAGE_2.to_string(),
            raw_path("a.tf"),
            raw_path("b.tf"),
        ]
    );
}

#[test]
fn single_file_failure_aborts_whole_bundle() {
    let server = MockServer::start(|_, path| {
        if path == TREE_PAGE_1 {
            return MockResponse::json(
                json!([
                    {"type": "blob", "path": "main.tf"},
                    {"type": "blob", "path": "vars.tf"},
                ])
                .to_string(),
            );
        }
        if path == raw_path("main.tf") {
            return MockResponse::text("# ok");
        }
        MockResponse::status(403)
    });

    let err = fetcher(&server)
        .fetch_bundle("https://gitlab.com/group/infra", "main")
        .expect_err("file fetch should fail");
    assert!(matches!(err, RemoteFetchError::Status { status: 403, .. }));
}

#[test]
fn tree_listing_failure_is_fatal() {
    let server = MockServer::start(|_, _| MockResponse::status(401));
    let err = fetcher(&server)
        .fetch_bundle("https://gitlab.com/group/infra", "main")
        .expect_err("listing should fail");
    assert_eq!(err.status(), Some(401));
}

#[test]
fn empty_bundle_renders_empty_text() {
    assert_eq!(RepositoryBundle::new().render(), "");
}
