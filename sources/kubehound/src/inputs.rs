//! Inputs describing where to find a node's kubelet configuration.
//!
//! These are usually read from a YAML inputs file:
//!
//! ```yaml
//! kubelet_config: /etc/kubernetes/kubelet/kubelet-config.json
//! node_name: ip-192-168-31-226.ec2.internal
//! proxy_hostname: localhost
//! proxy_port: 8001
//! kubelet_service: kubelet
//! external_cert_authority_in_use: false
//! client_ca_file_path: /etc/kubernetes/pki/ca.crt
//! ```
//!
//! Every field is optional, and empty strings count as unset.

use crate::configz::{ProxyEndpoint, DEFAULT_TIMEOUT_SECONDS};
use crate::error::{self, Result};
use crate::resolver::{ConfigSource, SourceKind};
use serde::{de, Deserialize, Deserializer};
use snafu::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shortest proxy timeout allowed; a zero timeout would fail every request.
const MIN_TIMEOUT_SECONDS: u64 = 1;

/// Precedence of source kinds when more than one is configured.
const PRECEDENCE: [SourceKind; 3] = [SourceKind::File, SourceKind::Proxy, SourceKind::Service];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodeInputs {
    /// Kubelet config file, `.json`, `.yaml` or `.yml`.
    pub kubelet_config: Option<PathBuf>,
    pub node_name: Option<String>,
    pub proxy_hostname: Option<String>,
    #[serde(deserialize_with = "deserialize_port")]
    pub proxy_port: Option<u16>,
    /// The kubelet's full command line.
    pub kubelet_command_line: Option<String>,
    /// systemd unit to read the command line from, when `kubelet_command_line` is not given.
    pub kubelet_service: Option<String>,
    /// Certificates are rotated by an outside authority, so rotation checks do not apply.
    pub external_cert_authority_in_use: bool,
    /// Expected location of the client certificate authority file.
    pub client_ca_file_path: Option<String>,
    /// Must be at least one second.
    #[serde(deserialize_with = "deserialize_timeout")]
    pub proxy_timeout_seconds: Option<u64>,
}

impl NodeInputs {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).context(error::InputsReadSnafu { path })?;
        let inputs: NodeInputs =
            serde_yaml::from_str(&s).context(error::InputsParseSnafu { path })?;
        Ok(inputs.normalized())
    }

    /// Turns empty strings into `None`.
    pub fn normalized(self) -> Self {
        Self {
            kubelet_config: self
                .kubelet_config
                .filter(|path| !path.to_string_lossy().trim().is_empty()),
            node_name: non_empty(self.node_name),
            proxy_hostname: non_empty(self.proxy_hostname),
            kubelet_command_line: non_empty(self.kubelet_command_line),
            kubelet_service: non_empty(self.kubelet_service),
            client_ca_file_path: non_empty(self.client_ca_file_path),
            ..self
        }
    }

    /// The proxy is only usable when hostname, port and node name are all given.
    pub fn proxy_endpoint(&self) -> Option<ProxyEndpoint> {
        match (&self.proxy_hostname, self.proxy_port, &self.node_name) {
            (Some(hostname), Some(port), Some(node_name)) => {
                Some(ProxyEndpoint::new(hostname, port, node_name))
            }
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        let seconds = self
            .proxy_timeout_seconds
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
            .max(MIN_TIMEOUT_SECONDS);
        Duration::from_secs(seconds)
    }

    /// A fresh source of the given kind, or `ConfigSource::None` if the inputs do not
    /// configure one.
    pub fn source(&self, kind: SourceKind) -> ConfigSource {
        match kind {
            SourceKind::File => self
                .kubelet_config
                .clone()
                .map_or(ConfigSource::None, ConfigSource::FilePath),
            SourceKind::Proxy => self
                .proxy_endpoint()
                .map_or(ConfigSource::None, ConfigSource::ProxyEndpoint),
            SourceKind::Service => match (&self.kubelet_command_line, &self.kubelet_service) {
                (Some(command_line), _) => ConfigSource::ServiceHandle(command_line.clone()),
                (None, Some(unit)) => ConfigSource::ServiceUnit(unit.clone()),
                (None, None) => ConfigSource::None,
            },
        }
    }

    /// Sources of the allowed kinds, in precedence order: file, then proxy, then service.
    pub fn sources(&self, allowed: &[SourceKind]) -> Vec<ConfigSource> {
        PRECEDENCE
            .iter()
            .filter(|kind| allowed.contains(kind))
            .map(|kind| self.source(*kind))
            .collect()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Ports may be written as a number or a string; an empty string means unset.
fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Option::<Port>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Port::Number(port)) => Ok(Some(port)),
        Some(Port::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Port::Text(text)) => text
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid proxy_port '{}': {}", text, e))),
    }
}

fn deserialize_timeout<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<u64>::deserialize(deserializer)? {
        Some(seconds) if seconds < MIN_TIMEOUT_SECONDS => Err(de::Error::custom(format!(
            "proxy_timeout_seconds must be at least {}",
            MIN_TIMEOUT_SECONDS
        ))),
        seconds => Ok(seconds),
    }
}
