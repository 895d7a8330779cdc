use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

/// A single fully-evaluated deployment flag passed to cluster creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployArg {
    name: String,
    value: String,
}

impl DeployArg {
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Argument vector element for direct process execution (no shell quoting).
    ///
    /// An empty value yields a bare `--name`.
    pub fn to_arg(&self) -> String {
        if self.value.is_empty() {
            format!("--{}", self.name)
        } else {
            format!("--{}={}", self.name, self.value)
        }
    }
}

impl fmt::Display for DeployArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}", self.name)?;
        if !self.value.is_empty() {
            f.write_char('=')?;
            write_quoted(f, &self.value)?;
        }
        Ok(())
    }
}

/// Ordered list of rendered deployment flags.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeployArgs(pub Vec<DeployArg>);

impl DeployArgs {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, arg: DeployArg) {
        self.0.push(arg);
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeployArg> {
        self.0.iter()
    }

    /// Flatten into process arguments, preserving order.
    pub fn to_argv(&self) -> Vec<String> {
        self.0.iter().map(DeployArg::to_arg).collect()
    }
}

impl fmt::Display for DeployArgs {
    /// Space separated shell-style rendering: `--a="x" --b`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{arg}")?;
        }
        Ok(())
    }
}

impl FromIterator<DeployArg> for DeployArgs {
    fn from_iter<I: IntoIterator<Item = DeployArg>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Double-quote `s`, escaping backslashes, quotes and control characters.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if (c as u32) < 0x20 || c == '\u{7f}' => write!(f, "\\x{:02x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}
