use argh::FromArgs;
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl FromStr for Format {
    type Err = ();

    fn from_str(value: &str) -> Result<Format, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            _ => Err(()),
        }
    }
}

fn str_to_format(value: &str) -> Result<Format, String> {
    match Format::from_str(value) {
        Ok(f) => Ok(f),
        _ => Err("invalid format, options are 'text' or 'json'".to_string()),
    }
}

#[derive(FromArgs, Debug)]
/// Checks a node's kubelet configuration against the EKS CIS benchmark.
pub struct Arguments {
    /// path to a YAML file describing where to find the kubelet configuration
    #[argh(option, short = 'i')]
    pub inputs: Option<PathBuf>,
    /// path to the kubelet config file (.json, .yaml or .yml)
    #[argh(option)]
    pub kubelet_config: Option<PathBuf>,
    /// name of the node whose live config is read through the proxy
    #[argh(option)]
    pub node_name: Option<String>,
    /// hostname of the API server proxy
    #[argh(option)]
    pub proxy_hostname: Option<String>,
    /// port of the API server proxy
    #[argh(option)]
    pub proxy_port: Option<u16>,
    /// the kubelet's full command line
    #[argh(option)]
    pub kubelet_command_line: Option<String>,
    /// systemd unit to read the kubelet command line from
    #[argh(option)]
    pub kubelet_service: Option<String>,
    /// the node uses an external authority to rotate certificates
    #[argh(switch)]
    pub external_cert_authority: bool,
    /// format of the output
    #[argh(
        option,
        default = "Format::Text",
        from_str_fn(str_to_format),
        short = 'f'
    )]
    pub format: Format,
    /// the CIS benchmark compliance level to check
    #[argh(option, default = "1", short = 'l')]
    pub level: u8,
    /// write output to a file at given path [default: stdout]
    #[argh(option, short = 'o')]
    pub output: Option<String>,
    /// logging verbosity [trace|debug|info|warn|error]
    #[argh(option, default = "LevelFilter::Info")]
    pub log_level: LevelFilter,
}
