//! Parses a service's command line into a table of flags.

use crate::document::ResolvedValue;
use crate::error::{self, Result};
use log::trace;
use regex::Regex;
use serde_json::Value;
use snafu::{ensure, ResultExt};
use std::collections::HashMap;

/// Delimiter used by the `--flag=value` form.
pub const EQUALS: &str = "=";
/// Delimiter used by the `--flag:value` form.
pub const COLON: &str = ":";

/// The value recorded for a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    /// The token had a delimiter; the text to its right, possibly empty.
    Set(String),
    /// The token had no delimiter, the flag is only present.
    NoValue,
}

/// Flags of one command line, keyed by their name including leading dashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagTable {
    delimiter: String,
    flags: HashMap<String, FlagValue>,
}

impl FlagTable {
    /// Splits `command_line` on whitespace and records each token as a flag.
    ///
    /// A token of the form `name<delimiter>value` records `value` for `name`; the flag name is
    /// everything left of the last delimiter. A token without the delimiter is recorded as a
    /// flag with no value. Later tokens overwrite earlier ones for the same flag. An empty
    /// command line gives an empty table.
    pub fn parse(command_line: &str, delimiter: &str) -> Result<Self> {
        ensure!(!delimiter.is_empty(), error::EmptyDelimiterSnafu);
        let pattern = format!(
            r"^(?P<flag>\S+)?{}(?P<value>\S+)?$",
            regex::escape(delimiter)
        );
        let assignment = Regex::new(&pattern).context(error::DelimiterPatternSnafu { delimiter })?;

        let mut flags = HashMap::new();
        for token in command_line.split_whitespace() {
            let (name, value) = match assignment.captures(token) {
                Some(captures) => {
                    let name = captures.name("flag").map(|m| m.as_str());
                    let value = captures
                        .name("value")
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default();
                    (name, FlagValue::Set(value))
                }
                None => (Some(token), FlagValue::NoValue),
            };
            // A token like "=0" names no flag at all.
            let Some(name) = name else {
                trace!("Ignoring token '{}' without a flag name", token);
                continue;
            };
            trace!("Parsed flag '{}' as {:?}", name, value);
            flags.insert(name.to_string(), value);
        }

        Ok(Self {
            delimiter: delimiter.to_string(),
            flags,
        })
    }

    pub fn get(&self, flag: &str) -> Option<&FlagValue> {
        self.flags.get(flag)
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.flags.contains_key(flag)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FlagValue)> {
        self.flags.iter()
    }

    /// The effective value of `flag`. Values are always strings; a flag given without a value
    /// resolves to `true`, the way boolean kubelet flags behave.
    pub fn resolve(&self, flag: &str) -> ResolvedValue {
        match self.flags.get(flag) {
            Some(FlagValue::Set(value)) => ResolvedValue::Present(Value::String(value.clone())),
            Some(FlagValue::NoValue) => ResolvedValue::Present(Value::Bool(true)),
            None => ResolvedValue::Absent,
        }
    }

    /// Rebuilds the command line token for `flag` from the recorded value.
    pub fn format(&self, flag: &str) -> Option<String> {
        self.flags.get(flag).map(|value| match value {
            FlagValue::Set(value) => format!("{}{}{}", flag, self.delimiter, value),
            FlagValue::NoValue => flag.to_string(),
        })
    }
}
