//! Works out the effective value of a kubelet setting from whichever source is configured.

use crate::config_file;
use crate::configz::{self, ProxyEndpoint, CONFIGZ_WRAPPER_KEY};
use crate::document::{KeyPath, ResolvedValue};
use crate::error::{self, Result};
use crate::service_args::FlagTable;
use crate::systemd;
use log::debug;
use snafu::OptionExt;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The kinds of place a setting can be read from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    File,
    Proxy,
    Service,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::File => write!(f, "kubelet config file"),
            SourceKind::Proxy => write!(f, "kubelet configz API"),
            SourceKind::Service => write!(f, "kubelet service flag"),
        }
    }
}

/// One place to look for kubelet settings. Built fresh for every evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A JSON or YAML config file; the format comes from the extension.
    FilePath(PathBuf),
    /// The live config of a node, through an API server proxy.
    ProxyEndpoint(ProxyEndpoint),
    /// A raw service command line.
    ServiceHandle(String),
    /// A systemd unit whose `ExecStart` holds the command line.
    ServiceUnit(String),
    None,
}

impl ConfigSource {
    pub fn kind(&self) -> Option<SourceKind> {
        match self {
            ConfigSource::FilePath(_) => Some(SourceKind::File),
            ConfigSource::ProxyEndpoint(_) => Some(SourceKind::Proxy),
            ConfigSource::ServiceHandle(_) | ConfigSource::ServiceUnit(_) => {
                Some(SourceKind::Service)
            }
            ConfigSource::None => None,
        }
    }
}

/// A command line flag that carries the same setting as a config key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFlag {
    pub name: String,
    pub delimiter: String,
}

/// A named kubelet setting: where it lives in a config document, and optionally which flag
/// sets it on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub path: KeyPath,
    pub flag: Option<ServiceFlag>,
}

impl Setting {
    /// A setting that only exists in config documents.
    pub fn key<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: KeyPath::from_keys(keys),
            flag: None,
        }
    }

    /// Adds the command line form of the setting.
    pub fn with_flag<S1, S2>(mut self, name: S1, delimiter: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        self.flag = Some(ServiceFlag {
            name: name.into(),
            delimiter: delimiter.into(),
        });
        self
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.flag {
            Some(flag) if self.path.is_empty() => write!(f, "{}", flag.name),
            _ => write!(f, "{}", self.path),
        }
    }
}

pub struct SettingResolver {
    timeout: Duration,
}

impl Default for SettingResolver {
    fn default() -> Self {
        Self::new(Duration::from_secs(configz::DEFAULT_TIMEOUT_SECONDS))
    }
}

impl SettingResolver {
    /// `timeout` bounds the one network request a proxy source makes.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Resolves `setting` from the first configured source in `sources`; later sources are
    /// not consulted and nothing is merged.
    ///
    /// A source that is configured but unreadable gives `SourceUnavailable`, and one that
    /// answers with unparseable content gives `MalformedSource`. A source that can never answer
    /// (an unsupported file extension, a setting with no flag form for a service source) is an
    /// error, as is having no configured source at all (`NoSourceConfigured`).
    pub fn resolve(&self, setting: &Setting, sources: &[ConfigSource]) -> Result<ResolvedValue> {
        let source = sources
            .iter()
            .find(|source| source.kind().is_some())
            .context(error::NoSourceConfiguredSnafu)?;
        debug!("resolving '{}' from {:?}", setting, source);

        let value = match source {
            ConfigSource::FilePath(path) => {
                config_file::read(path).map(|doc| doc.get(&setting.path))
            }
            ConfigSource::ProxyEndpoint(endpoint) => configz::fetch(endpoint, self.timeout)
                .map(|doc| doc.get(&setting.path.under(CONFIGZ_WRAPPER_KEY))),
            ConfigSource::ServiceHandle(command_line) => Self::from_flags(setting, command_line),
            ConfigSource::ServiceUnit(unit) => systemd::exec_start(unit)
                .and_then(|command_line| Self::from_flags(setting, &command_line)),
            ConfigSource::None => error::NoSourceConfiguredSnafu.fail(),
        };
        classify(value)
    }

    fn from_flags(setting: &Setting, command_line: &str) -> Result<ResolvedValue> {
        let flag = setting.flag.as_ref().context(error::NoServiceFlagSnafu {
            setting: setting.to_string(),
        })?;
        let flags = FlagTable::parse(command_line, &flag.delimiter)?;
        Ok(flags.resolve(&flag.name))
    }
}

/// Turns source read failures into values; anything else stays an error.
fn classify(value: Result<ResolvedValue>) -> Result<ResolvedValue> {
    match value {
        Err(err) if err.is_decode() => Ok(ResolvedValue::MalformedSource(err.to_string())),
        Err(err) if err.is_unavailable() => Ok(ResolvedValue::SourceUnavailable(err.to_string())),
        other => other,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::service_args::{COLON, EQUALS};
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn read_only_port() -> Setting {
        Setting::key(["readOnlyPort"]).with_flag("--read-only-port", EQUALS)
    }

    #[test]
    fn no_sources() {
        let resolver = SettingResolver::default();
        let err = resolver.resolve(&read_only_port(), &[]).unwrap_err();
        assert!(matches!(err, Error::NoSourceConfigured));
        assert!(err.to_string().to_lowercase().contains("no inputs given"));

        let err = resolver
            .resolve(&read_only_port(), &[ConfigSource::None, ConfigSource::None])
            .unwrap_err();
        assert!(matches!(err, Error::NoSourceConfigured));
    }

    #[test]
    fn service_line() {
        let resolver = SettingResolver::default();
        let sources = [
            ConfigSource::None,
            ConfigSource::ServiceHandle("/usr/bin/kubelet --read-only-port=0".to_string()),
        ];
        assert_eq!(
            resolver.resolve(&read_only_port(), &sources).unwrap(),
            ResolvedValue::Present(json!("0"))
        );
    }

    #[test]
    fn service_line_without_flag() {
        let resolver = SettingResolver::default();
        let sources = [ConfigSource::ServiceHandle(String::new())];
        assert_eq!(
            resolver.resolve(&read_only_port(), &sources).unwrap(),
            ResolvedValue::Absent
        );
    }

    #[test]
    fn setting_without_flag_form() {
        let resolver = SettingResolver::default();
        let sources = [ConfigSource::ServiceHandle("--rotate-certificates:true".to_string())];
        let err = resolver
            .resolve(&Setting::key(["rotateCertificates"]), &sources)
            .unwrap_err();
        assert!(matches!(err, Error::NoServiceFlag { .. }));
    }

    #[test]
    fn first_configured_source_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"eventRecordQPS": 5}"#).unwrap();
        let setting = Setting::key(["eventRecordQPS"]).with_flag("--eventRecordQPS", COLON);
        let sources = [
            ConfigSource::FilePath(path),
            ConfigSource::ServiceHandle("--eventRecordQPS:0".to_string()),
        ];
        assert_eq!(
            SettingResolver::default().resolve(&setting, &sources).unwrap(),
            ResolvedValue::Present(json!(5))
        );
    }

    #[test]
    fn file_absent_setting_does_not_fall_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "kind: KubeletConfiguration\n").unwrap();
        let sources = [
            ConfigSource::FilePath(path),
            ConfigSource::ServiceHandle("--read-only-port=0".to_string()),
        ];
        assert_eq!(
            SettingResolver::default()
                .resolve(&read_only_port(), &sources)
                .unwrap(),
            ResolvedValue::Absent
        );
    }

    #[test]
    fn unsupported_format_is_fatal() {
        let sources = [
            ConfigSource::FilePath(PathBuf::from("/etc/kubernetes/kubelet/config")),
            ConfigSource::ServiceHandle("--read-only-port=0".to_string()),
        ];
        let err = SettingResolver::default()
            .resolve(&read_only_port(), &sources)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let sources = [ConfigSource::FilePath(PathBuf::from("/not/a/real/config.json"))];
        assert!(matches!(
            SettingResolver::default().resolve(&read_only_port(), &sources),
            Ok(ResolvedValue::SourceUnavailable(_))
        ));
    }

    #[test]
    fn malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "readOnlyPort: [unterminated\n").unwrap();
        assert!(matches!(
            SettingResolver::default().resolve(&read_only_port(), &[ConfigSource::FilePath(path)]),
            Ok(ResolvedValue::MalformedSource(_))
        ));
    }

    #[test]
    fn proxy_source_uses_wrapper_key() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/api/v1/nodes/node-1/proxy/configz",
            ))
            .respond_with(json_encoded(json!({"kubeletconfig": {"eventRecordQPS": 5}}))),
        );
        let addr = server.addr();
        let sources = [ConfigSource::ProxyEndpoint(ProxyEndpoint::new(
            addr.ip().to_string(),
            addr.port(),
            "node-1",
        ))];
        assert_eq!(
            SettingResolver::new(Duration::from_secs(5))
                .resolve(&Setting::key(["eventRecordQPS"]), &sources)
                .unwrap(),
            ResolvedValue::Present(json!(5))
        );
    }

    #[test]
    fn proxy_decode_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/api/v1/nodes/node-1/proxy/configz",
            ))
            .respond_with(status_code(200).body("not json")),
        );
        let addr = server.addr();
        let sources = [ConfigSource::ProxyEndpoint(ProxyEndpoint::new(
            addr.ip().to_string(),
            addr.port(),
            "node-1",
        ))];
        assert!(matches!(
            SettingResolver::new(Duration::from_secs(5))
                .resolve(&Setting::key(["eventRecordQPS"]), &sources),
            Ok(ResolvedValue::MalformedSource(_))
        ));
    }
}
