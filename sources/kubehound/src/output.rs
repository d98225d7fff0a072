use std::io::{Error, Write};

use crate::results::{CheckStatus, ReportResults};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub trait ReportWriter {
    fn write(&self, report: &ReportResults, output: &mut dyn Write) -> Result<(), Error>;
}

pub struct TextReportWriter {}

impl ReportWriter for TextReportWriter {
    /// Writes a text formatted report to the provided output destination. Rules that did not
    /// pass are followed by the reason.
    fn write(&self, report: &ReportResults, output: &mut dyn Write) -> Result<(), Error> {
        if let Some(name) = &report.metadata.name {
            writeln!(output, "{:17}{}", "Benchmark name:", name)?;
        }
        if let Some(version) = &report.metadata.version {
            writeln!(output, "{:17}{}", "Version:", version)?;
        }
        if let Some(url) = &report.metadata.url {
            writeln!(output, "{:17}{}", "Reference:", url)?;
        }
        writeln!(output, "{:17}{}", "Benchmark level:", report.level)?;
        writeln!(output, "{:17}{}", "Start time:", report.timestamp)?;
        writeln!(output)?;

        for test_result in report.results.values() {
            writeln!(
                output,
                "[{}] {:9} {} ({})",
                test_result.result.status,
                test_result.metadata.id,
                test_result.metadata.title,
                test_result.metadata.mode
            )?;
            if test_result.result.status != CheckStatus::PASS
                && !test_result.result.explanation.is_empty()
            {
                writeln!(output, "{:8}{}", "", test_result.result.explanation)?;
            }
        }

        writeln!(output)?;
        writeln!(output, "{:17}{}", "Passed:", report.passed)?;
        writeln!(output, "{:17}{}", "Failed:", report.failed)?;
        writeln!(output, "{:17}{}", "Errored:", report.errored)?;
        writeln!(output, "{:17}{}", "Skipped:", report.skipped)?;
        writeln!(output, "{:17}{}", "Total checks:", report.total)?;
        writeln!(output)?;
        writeln!(output, "Compliance check result: {}", report.status)
    }
}

pub struct JsonReportWriter {}

impl ReportWriter for JsonReportWriter {
    /// Writes a json formatted report to the provided output destination.
    fn write(&self, report: &ReportResults, output: &mut dyn Write) -> Result<(), Error> {
        let json = serde_json::to_string(&report)?;
        writeln!(output, "{}", json)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::results::{CheckerMetadata, CheckerResult, Mode, ReportMetadata};

    fn report() -> ReportResults {
        let mut report = ReportResults::new(
            1,
            ReportMetadata {
                name: Some("CIS Amazon EKS Benchmark".to_string()),
                ..Default::default()
            },
        );
        report.add_result(
            CheckerMetadata {
                name: "eks03020400".to_string(),
                id: "3.2.4".to_string(),
                level: 1,
                title: "Ensure that the --read-only-port is secured".to_string(),
                mode: Mode::Automatic,
            },
            CheckerResult::fail("[FAIL] kubelet config readOnlyPort: found 10255, expected 0"),
        );
        report.add_result(
            CheckerMetadata {
                name: "eks03021000".to_string(),
                id: "3.2.10".to_string(),
                level: 1,
                title: "Ensure that the --rotate-certificates argument is not set to false"
                    .to_string(),
                mode: Mode::Automatic,
            },
            CheckerResult::pass("kubelet config rotateCertificates: found true"),
        );
        report
    }

    #[test]
    fn text_report() {
        let mut output = Vec::new();
        TextReportWriter {}.write(&report(), &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("Benchmark name:  CIS Amazon EKS Benchmark\n"));
        assert!(text.contains("[FAIL] 3.2.4     Ensure that the --read-only-port is secured (Automatic)\n"));
        assert!(text.contains("        [FAIL] kubelet config readOnlyPort: found 10255, expected 0\n"));
        assert!(!text.contains("found true"));
        assert!(text.contains("Errored:         0\n"));
        assert!(text.ends_with("Compliance check result: FAIL\n"));
    }

    #[test]
    fn json_report() {
        let mut output = Vec::new();
        JsonReportWriter {}.write(&report(), &mut output).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["status"], "FAIL");
        assert_eq!(value["name"], "CIS Amazon EKS Benchmark");
        assert_eq!(value["failed"], 1);
        assert_eq!(value["results"]["eks03020400"]["id"], "3.2.4");
        assert_eq!(value["results"]["eks03020400"]["status"], "FAIL");
        assert!(value.get("version").is_none());
    }
}
