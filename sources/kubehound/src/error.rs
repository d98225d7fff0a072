//! Provides the list of errors for `kubehound`.

use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Kubelet config file path is empty"))]
    EmptyConfigPath,

    #[snafu(display(
        "Unsupported kubelet config file format '{}' for {}, expected one of '.json', '.yaml', '.yml'",
        extension,
        path.display()
    ))]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[snafu(display("Failed to read kubelet config file {}: {}", path.display(), source))]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to parse JSON kubelet config {}: {}", path.display(), source))]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("Failed to parse YAML kubelet config {}: {}", path.display(), source))]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("Unable to parse URL {}: {}", url, source))]
    UrlParse {
        url: String,
        source: url::ParseError,
    },

    #[snafu(display("URL {} cannot carry a path", url))]
    UrlBase { url: String },

    #[snafu(display("Error building HTTP client for {}: {}", url, source))]
    HttpClient { url: String, source: reqwest::Error },

    #[snafu(display("Error sending HTTP request to {}: {}", url, source))]
    HttpSend { url: String, source: reqwest::Error },

    #[snafu(display("Error receiving HTTP response {}: {}", url, source))]
    HttpResponse { url: String, source: reqwest::Error },

    #[snafu(display("Error reading HTTP response body from {}: {}", url, source))]
    HttpBody { url: String, source: reqwest::Error },

    #[snafu(display("Response from {} is not valid JSON: {}", url, source))]
    ConfigzDecode {
        url: String,
        source: serde_json::Error,
    },

    #[snafu(display(
        "No inputs given: there should be inputs given on how to find kubelet config data"
    ))]
    NoSourceConfigured,

    #[snafu(display(
        "Setting '{}' has no command line flag, it cannot be read from a service invocation",
        setting
    ))]
    NoServiceFlag { setting: String },

    #[snafu(display("Flag assignment delimiter must not be empty"))]
    EmptyDelimiter,

    #[snafu(display("Invalid flag assignment delimiter '{}': {}", delimiter, source))]
    DelimiterPattern {
        delimiter: String,
        source: regex::Error,
    },

    #[snafu(display("Failed to read inputs file {}: {}", path.display(), source))]
    InputsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to parse inputs file {}: {}", path.display(), source))]
    InputsParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("Command 'systemctl' with args '{:?}' failed: {}", args, source))]
    SystemctlCommand {
        args: Vec<String>,
        source: std::io::Error,
    },

    #[snafu(display("'systemctl show' for unit '{}' exited with {}: {}", unit, code, stderr))]
    SystemctlStatus {
        unit: String,
        code: i32,
        stderr: String,
    },
}

impl Error {
    /// Whether the error means a remote source could not be reached or did not answer.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::UrlParse { .. }
                | Error::UrlBase { .. }
                | Error::HttpClient { .. }
                | Error::HttpSend { .. }
                | Error::HttpResponse { .. }
                | Error::HttpBody { .. }
        )
    }

    /// Whether the error means a configured source could not be read at all: a missing file,
    /// an unreachable proxy or a unit that systemd cannot show.
    pub fn is_unavailable(&self) -> bool {
        self.is_network()
            || matches!(
                self,
                Error::ConfigRead { .. }
                    | Error::SystemctlCommand { .. }
                    | Error::SystemctlStatus { .. }
            )
    }

    /// Whether the error means a source answered with content that could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::JsonParse { .. } | Error::YamlParse { .. } | Error::ConfigzDecode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
