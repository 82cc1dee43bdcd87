//! Mock server helpers for GitHub API tests

use expertup_update::checksum::digest_bytes;
use expertup_update::Release;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

/// Serve a release at `/releases/tags/{tag}`
pub async fn mock_release_by_tag(server: &MockServer, release: &Release) {
    Mock::given(method("GET"))
        .and(path(tag_path(&release.tag_name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

/// Serve the release list at `/releases`
pub async fn mock_release_list(server: &MockServer, releases: &[Release]) {
    Mock::given(method("GET"))
        .and(path(RELEASES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(releases))
        .mount(server)
        .await;
}

/// Serve an asset and expect exactly `times` downloads of it
///
/// The expectation is verified when the server is dropped.
pub async fn mock_asset_download(server: &MockServer, id: u64, content: &[u8], times: u64) {
    Mock::given(method("GET"))
        .and(path(asset_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content))
        .expect(times)
        .mount(server)
        .await;
}

/// Serve a checksums file listing `content` as the digest of `asset_name`
pub async fn mock_checksums(server: &MockServer, asset_name: &str, content: &[u8]) {
    let body = format!(
        "{}  ./{}\n{}  ./{}\n",
        digest_bytes(b"some other platform"),
        ASSET_DARWIN_ARM64,
        digest_bytes(content),
        asset_name
    );
    Mock::given(method("GET"))
        .and(path(asset_path(ID_CHECKSUMS)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Answer a path with an error status and body
pub async fn mock_api_error(server: &MockServer, api_path: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(api_path.to_string()))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}
