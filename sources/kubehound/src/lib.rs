/*!
# Introduction

Kubehound checks a Kubernetes node's kubelet configuration against the EKS CIS benchmark.

A kubelet setting can be read from three places:

* the kubelet config file, JSON or YAML, chosen by its extension;
* the node's live configuration, fetched from the `configz` endpoint through an API server
  proxy such as `kubectl proxy`;
* the kubelet's command line, either given directly or read from the `ExecStart` of its
  systemd unit.

Each rule lists one or more alternative ways of detecting that it holds. Every alternative
resolves its setting from the first configured source it is allowed to use, and the rule passes
if any alternative passes. A rule that cannot read any source reports `ERROR` rather than a
verdict.

# Usage

```text
kubehound --inputs /etc/kubehound/inputs.yml --level 2 --format json
```

Run `kubehound --help` for all options. Command line options override the inputs file.
*/

pub mod args;
pub mod assertion;
pub mod checks;
pub mod config_file;
pub mod configz;
pub mod document;
pub mod error;
pub mod inputs;
pub mod one_of;
pub mod output;
pub mod resolver;
pub mod results;
pub mod rule;
pub mod service_args;
pub mod systemd;
