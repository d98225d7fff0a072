use kubehound::args::{Arguments, Format};
use kubehound::checks::eks_kubelet_rules;
use kubehound::error::Result;
use kubehound::inputs::NodeInputs;
use kubehound::output::{JsonReportWriter, ReportWriter, TextReportWriter};
use kubehound::results::{Checker, ReportMetadata, ReportResults};
use log::{debug, info};
use simplelog::{Config as LogConfig, SimpleLogger};
use std::fs::File;
use std::io::{stdout, Error, Write};
use std::process;

// Define some exit codes for error conditions
const INPUTS_ERROR: i32 = 2;
const REPORT_OUTPUT_ERROR: i32 = 3;
const NO_CHECKS_RUN_ERROR: i32 = 4;

const BENCHMARK_NAME: &str = "CIS Amazon Elastic Kubernetes Service (EKS) Benchmark";

/// Reads the inputs file, if any, then applies the command line on top of it.
fn load_inputs(args: &Arguments) -> Result<NodeInputs> {
    let mut inputs = match &args.inputs {
        Some(path) => NodeInputs::from_file(path)?,
        None => NodeInputs::default(),
    };

    if let Some(path) = &args.kubelet_config {
        inputs.kubelet_config = Some(path.clone());
    }
    if let Some(node_name) = &args.node_name {
        inputs.node_name = Some(node_name.clone());
    }
    if let Some(hostname) = &args.proxy_hostname {
        inputs.proxy_hostname = Some(hostname.clone());
    }
    if let Some(port) = args.proxy_port {
        inputs.proxy_port = Some(port);
    }
    if let Some(command_line) = &args.kubelet_command_line {
        inputs.kubelet_command_line = Some(command_line.clone());
    }
    if let Some(unit) = &args.kubelet_service {
        inputs.kubelet_service = Some(unit.clone());
    }
    if args.external_cert_authority {
        inputs.external_cert_authority_in_use = true;
    }
    Ok(inputs.normalized())
}

fn get_output(output: &Option<String>) -> std::result::Result<Box<dyn Write>, Error> {
    match output {
        Some(path) => File::create(path).map(|f| Box::new(f) as Box<dyn Write>),
        None => Ok(Box::new(stdout())),
    }
}

fn main() {
    let args: Arguments = argh::from_env();
    SimpleLogger::init(args.log_level, LogConfig::default()).expect("unable to configure logger");

    let inputs = load_inputs(&args).unwrap_or_else(|err| {
        eprintln!("{}", err);
        process::exit(INPUTS_ERROR);
    });
    debug!("Using inputs: {:?}", inputs);

    let mut report = ReportResults::new(
        args.level,
        ReportMetadata {
            name: Some(BENCHMARK_NAME.to_string()),
            ..Default::default()
        },
    );

    // Rules run one at a time, each reading its sources afresh
    for rule in eks_kubelet_rules(&inputs) {
        let metadata = rule.metadata();
        if metadata.level > args.level {
            continue;
        }
        info!("Checking {} ({})", metadata.id, metadata.name);
        let result = rule.execute(&inputs);
        debug!("{} result: {}", metadata.id, result);
        report.add_result(metadata, result);
    }

    // Write appropriate output results report
    let mut output_dest = get_output(&args.output).unwrap_or_else(|err| {
        eprintln!("Error writing to output destination {}!", err);
        process::exit(REPORT_OUTPUT_ERROR);
    });

    let reporter: &dyn ReportWriter = match args.format {
        Format::Json => &JsonReportWriter {},
        Format::Text => &TextReportWriter {},
    };

    if let Err(err) = reporter.write(&report, &mut *output_dest) {
        eprintln!("Error writing report output: {}", err);
        process::exit(REPORT_OUTPUT_ERROR);
    }

    if !report.any_verdict() {
        // Every rule was skipped or could not read its sources, which usually means the
        // inputs do not point at anything
        eprintln!("Warning: No checks were able to run");
        process::exit(NO_CHECKS_RUN_ERROR);
    }
}
