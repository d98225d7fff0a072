//! Fetches a node's live kubelet configuration through a local API server proxy, e.g. one
//! started with `kubectl proxy --port=8001`.

use crate::document::ParsedDocument;
use crate::error::{self, Result};
use log::debug;
use reqwest::blocking::Client;
use serde_json::Value;
use snafu::{OptionExt, ResultExt};
use std::net::Ipv6Addr;
use std::time::Duration;
use url::Url;

/// The `configz` endpoint wraps the kubelet configuration object under this key.
pub const CONFIGZ_WRAPPER_KEY: &str = "kubeletconfig";

/// Used when the caller does not ask for a specific timeout.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Where to reach the proxy, and which node to ask about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub hostname: String,
    pub port: u16,
    pub node_name: String,
}

impl ProxyEndpoint {
    pub fn new<S1, S2>(hostname: S1, port: u16, node_name: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            hostname: hostname.into(),
            port,
            node_name: node_name.into(),
        }
    }

    /// `http://{hostname}:{port}/api/v1/nodes/{nodeName}/proxy/configz`, with the node name
    /// escaped as a single path segment. Bare IPv6 addresses are bracketed.
    pub fn url(&self) -> Result<Url> {
        let host = match self.hostname.parse::<Ipv6Addr>() {
            Ok(ip) => format!("[{}]", ip),
            Err(_) => self.hostname.clone(),
        };
        let base = format!("http://{}:{}/", host, self.port);
        let mut url = Url::parse(&base).context(error::UrlParseSnafu { url: &base })?;
        url.path_segments_mut()
            .ok()
            .context(error::UrlBaseSnafu { url: &base })?
            .clear()
            .extend([
                "api",
                "v1",
                "nodes",
                self.node_name.as_str(),
                "proxy",
                "configz",
            ]);
        Ok(url)
    }
}

/// Issues exactly one GET to the node's `configz` endpoint and decodes the JSON body. The
/// returned document still has the `kubeletconfig` wrapper; there are no retries.
pub fn fetch(endpoint: &ProxyEndpoint, timeout: Duration) -> Result<ParsedDocument> {
    let url = endpoint.url()?;
    let url_str = url.to_string();
    debug!("fetching live kubelet config: {}", url_str);

    let client = Client::builder()
        .timeout(timeout)
        .build()
        .context(error::HttpClientSnafu { url: &url_str })?;
    let response = client
        .get(url)
        .send()
        .context(error::HttpSendSnafu { url: &url_str })?
        .error_for_status()
        .context(error::HttpResponseSnafu { url: &url_str })?;
    let body = response
        .text()
        .context(error::HttpBodySnafu { url: &url_str })?;
    let root: Value =
        serde_json::from_str(&body).context(error::ConfigzDecodeSnafu { url: &url_str })?;

    Ok(ParsedDocument::new(root))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::{KeyPath, ResolvedValue};
    use crate::error::Error;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;
    use std::time::Instant;

    fn endpoint_for(server: &Server, node_name: &str) -> ProxyEndpoint {
        let addr = server.addr();
        ProxyEndpoint::new(addr.ip().to_string(), addr.port(), node_name)
    }

    #[test]
    fn url_format() {
        let endpoint = ProxyEndpoint::new("localhost", 8001, "ip-192-168-31-226.ec2.internal");
        assert_eq!(
            endpoint.url().unwrap().as_str(),
            "http://localhost:8001/api/v1/nodes/ip-192-168-31-226.ec2.internal/proxy/configz"
        );
    }

    #[test]
    fn url_ipv6_host() {
        let endpoint = ProxyEndpoint::new("::1", 8001, "node-1");
        assert_eq!(
            endpoint.url().unwrap().as_str(),
            "http://[::1]:8001/api/v1/nodes/node-1/proxy/configz"
        );
        let endpoint = ProxyEndpoint::new("[fd00::10]", 8001, "node-1");
        assert_eq!(
            endpoint.url().unwrap().as_str(),
            "http://[fd00::10]:8001/api/v1/nodes/node-1/proxy/configz"
        );
    }

    #[test]
    fn url_escapes_node_name() {
        let endpoint = ProxyEndpoint::new("localhost", 8001, "node/1?watch#x");
        assert_eq!(
            endpoint.url().unwrap().as_str(),
            "http://localhost:8001/api/v1/nodes/node%2F1%3Fwatch%23x/proxy/configz"
        );
    }

    #[test]
    fn bad_hostname() {
        let endpoint = ProxyEndpoint::new("local host", 8001, "node-1");
        assert!(matches!(endpoint.url(), Err(Error::UrlParse { .. })));
    }

    #[test]
    fn fetch_configz() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/api/v1/nodes/node-1/proxy/configz",
            ))
            .times(1)
            .respond_with(json_encoded(json!({"kubeletconfig": {"eventRecordQPS": 5}}))),
        );
        let document =
            fetch(&endpoint_for(&server, "node-1"), Duration::from_secs(5)).unwrap();
        let path = KeyPath::from_keys(["eventRecordQPS"]).under(CONFIGZ_WRAPPER_KEY);
        assert_eq!(document.get(&path), ResolvedValue::Present(json!(5)));
    }

    #[test]
    fn non_json_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/api/v1/nodes/node-1/proxy/configz",
            ))
            .respond_with(status_code(200).body("<html>not json</html>")),
        );
        let err = fetch(&endpoint_for(&server, "node-1"), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::ConfigzDecode { .. }));
        assert!(err.is_decode());
    }

    #[test]
    fn error_status() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/api/v1/nodes/missing/proxy/configz",
            ))
            .respond_with(status_code(404)),
        );
        let err = fetch(&endpoint_for(&server, "missing"), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::HttpResponse { .. }));
        assert!(err.is_network());
    }

    #[test]
    fn unreachable_proxy() {
        // Grab a free port, then close the listener so nothing answers there.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = ProxyEndpoint::new("127.0.0.1", port, "node-1");
        let err = fetch(&endpoint, Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, Error::HttpSend { .. }));
        assert!(err.is_network());
    }

    #[test]
    fn slow_proxy_times_out() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/api/v1/nodes/node-1/proxy/configz",
            ))
            .respond_with(delay_and_then(
                Duration::from_secs(5),
                json_encoded(json!({"kubeletconfig": {}})),
            )),
        );
        let start = Instant::now();
        let err = fetch(&endpoint_for(&server, "node-1"), Duration::from_millis(500)).unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(4));
        assert!(err.is_network());
    }
}
