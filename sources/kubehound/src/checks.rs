//! The EKS CIS kubelet rules.

use crate::assertion::Predicate;
use crate::inputs::NodeInputs;
use crate::resolver::{Setting, SourceKind};
use crate::results::{CheckerMetadata, Mode};
use crate::rule::{Alternative, Rule, SkipCondition};
use crate::service_args::{COLON, EQUALS};
use serde_json::json;

/// Where EKS nodes keep the client certificate authority, unless the inputs say otherwise.
pub const DEFAULT_CLIENT_CA_FILE: &str = "/etc/kubernetes/pki/ca.crt";

/// Settings that live in the kubelet config document, read from the file or the live config.
const CONFIG: &[SourceKind] = &[SourceKind::File, SourceKind::Proxy];
const SERVICE: &[SourceKind] = &[SourceKind::Service];

/// Every built-in rule, in benchmark order.
pub fn eks_kubelet_rules(inputs: &NodeInputs) -> Vec<Rule> {
    let client_ca_file = inputs
        .client_ca_file_path
        .as_deref()
        .unwrap_or(DEFAULT_CLIENT_CA_FILE);
    vec![
        client_ca_file_rule(client_ca_file),
        read_only_port_rule(),
        event_record_qps_rule(),
        rotate_certificates_rule(),
        rotate_server_certificate_rule(),
        image_provenance_rule(),
    ]
}

fn metadata(name: &str, id: &str, level: u8, title: &str, mode: Mode) -> CheckerMetadata {
    CheckerMetadata {
        name: name.to_string(),
        id: id.to_string(),
        level,
        title: title.to_string(),
        mode,
    }
}

// =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<=

pub fn client_ca_file_rule(client_ca_file: &str) -> Rule {
    let setting = Setting::key(["authentication", "x509", "clientCAFile"]);
    Rule {
        metadata: metadata(
            "eks03020300",
            "3.2.3",
            1,
            "Ensure that the --client-ca-file argument is set as appropriate",
            Mode::Automatic,
        ),
        skip_when: None,
        alternatives: vec![Alternative::new(
            format!("kubelet config {}", setting),
            setting,
            CONFIG,
            Predicate::Equals(json!(client_ca_file)),
        )],
    }
}

// =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<=

/// Either an unset port or an explicit 0 disables the read-only port.
pub fn read_only_port_rule() -> Rule {
    let setting = Setting::key(["readOnlyPort"]).with_flag("--read-only-port", EQUALS);
    Rule {
        metadata: metadata(
            "eks03020400",
            "3.2.4",
            1,
            "Ensure that the --read-only-port is secured",
            Mode::Automatic,
        ),
        skip_when: None,
        alternatives: vec![
            Alternative::new(
                "kubelet config readOnlyPort unset",
                setting.clone(),
                CONFIG,
                Predicate::IsAbsent,
            ),
            Alternative::new(
                "kubelet config readOnlyPort",
                setting.clone(),
                CONFIG,
                Predicate::Equals(json!(0)),
            ),
            Alternative::new(
                "kubelet service flag --read-only-port unset",
                setting.clone(),
                SERVICE,
                Predicate::FlagAbsent,
            ),
            Alternative::new(
                "kubelet service flag --read-only-port",
                setting,
                SERVICE,
                Predicate::Equals(json!("0")),
            ),
        ],
    }
}

// =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<=

pub fn event_record_qps_rule() -> Rule {
    let setting = Setting::key(["eventRecordQPS"]).with_flag("--eventRecordQPS", COLON);
    Rule {
        metadata: metadata(
            "eks03020900",
            "3.2.9",
            2,
            "Ensure that the --eventRecordQPS argument is set to 0 or a level which ensures appropriate event capture",
            Mode::Automatic,
        ),
        skip_when: None,
        alternatives: vec![
            Alternative::new(
                "kubelet config eventRecordQPS",
                setting.clone(),
                CONFIG,
                Predicate::GreaterOrEqual(0.0),
            ),
            // An absent flag never compares, so this also requires the flag to be set
            Alternative::new(
                "kubelet service flag --eventRecordQPS",
                setting,
                SERVICE,
                Predicate::GreaterOrEqual(0.0),
            ),
        ],
    }
}

// =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<=

pub fn rotate_certificates_rule() -> Rule {
    let setting = Setting::key(["rotateCertificates"]);
    Rule {
        metadata: metadata(
            "eks03021000",
            "3.2.10",
            2,
            "Ensure that the --rotate-certificates argument is not set to false",
            Mode::Automatic,
        ),
        skip_when: Some(SkipCondition::ExternalCertAuthority),
        alternatives: vec![Alternative::new(
            "kubelet config rotateCertificates",
            setting,
            CONFIG,
            Predicate::NotEquals(json!(false)),
        )],
    }
}

// =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<=

pub fn rotate_server_certificate_rule() -> Rule {
    let setting = Setting::key(["featureGates", "RotateKubeletServerCertificate"])
        .with_flag("--rotate-kubelet-server-certificate", COLON);
    Rule {
        metadata: metadata(
            "eks03021100",
            "3.2.11",
            1,
            "Ensure that the RotateKubeletServerCertificate argument is set to true",
            Mode::Automatic,
        ),
        skip_when: Some(SkipCondition::ExternalCertAuthority),
        alternatives: vec![
            Alternative::new(
                "kubelet config featureGates.RotateKubeletServerCertificate",
                setting.clone(),
                CONFIG,
                Predicate::Equals(json!(true)),
            ),
            Alternative::new(
                "kubelet service flag --rotate-kubelet-server-certificate",
                setting,
                SERVICE,
                Predicate::Equals(json!(true)),
            ),
        ],
    }
}

// =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<= =>o.o<=

pub fn image_provenance_rule() -> Rule {
    Rule {
        metadata: metadata(
            "eks04050100",
            "4.5.1",
            2,
            "Configure Image Provenance using ImagePolicyWebhook admission controller",
            Mode::Manual,
        ),
        skip_when: Some(SkipCondition::Manual(
            "The ImagePolicy Webhook admission controller must be manually configured to ensure image provenance".to_string(),
        )),
        alternatives: Vec::new(),
    }
}
