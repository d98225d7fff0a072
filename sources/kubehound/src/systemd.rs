//! Looks up the command line a systemd unit runs.

use crate::error::{self, Result};
use log::trace;
use snafu::{ensure, ResultExt};
use std::process::Command;

const SYSTEMCTL: &str = "/usr/bin/systemctl";
const EXEC_START_PROPERTY: &str = "ExecStart";

/// Returns the command line from the `ExecStart` property of `unit`, for example
/// `/usr/bin/kubelet --config /etc/kubernetes/kubelet/config --read-only-port=0`.
pub fn exec_start(unit: &str) -> Result<String> {
    let args = ["show", "--property", EXEC_START_PROPERTY, "--value", unit];
    trace!("calling systemctl with '{:?}'", args);
    let output = Command::new(SYSTEMCTL)
        .args(args)
        .output()
        .with_context(|_| error::SystemctlCommandSnafu {
            args: args.iter().map(|&s| s.to_owned()).collect::<Vec<String>>(),
        })?;
    ensure!(
        output.status.success(),
        error::SystemctlStatusSnafu {
            unit,
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    );
    Ok(command_line(&String::from_utf8_lossy(&output.stdout)))
}

/// `systemctl show` prints the property as
/// `{ path=/usr/bin/kubelet ; argv[]=/usr/bin/kubelet --flag=value ; ignore_errors=no ; ... }`.
/// Picks out the `argv[]` part; anything else is returned trimmed as it is.
fn command_line(property: &str) -> String {
    let property = property.trim();
    let Some((_, argv)) = property.split_once("argv[]=") else {
        return property.to_string();
    };
    match argv.split_once(" ;") {
        Some((argv, _)) => argv.trim().to_string(),
        None => argv.trim_end_matches('}').trim().to_string(),
    }
}
