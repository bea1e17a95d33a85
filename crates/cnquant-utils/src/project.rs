//! Project metadata: the usage disclaimer and the index of CnQuant tools.
//!
//! The same text is rendered in `README.md` and by `cnquant tools`.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// GitHub organisation hosting the CnQuant repositories.
pub const GITHUB_ORG: &str = "neuropathbasel-pub";

/// Terms of use shipped with every CnQuant tool.
pub const DISCLAIMER: &str = "\
The CnQuant tools are provided for academic research and for diagnostic use \
by non-profit institutions only. Any commercial use requires prior written \
permission of the authors.

The software is provided \"as is\", without warranty of any kind, express or \
implied. The authors and their institutions accept no liability for any \
damage or diagnostic decision resulting from its use. Results must be \
reviewed by qualified personnel before they inform patient care.";

/// One external CnQuant tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tool {
    /// Display name.
    pub name: &'static str,
    /// What the tool does.
    pub purpose: &'static str,
    /// Repository URL.
    pub url: &'static str,
}

impl Tool {
    /// Last path segment of the repository URL.
    #[must_use]
    pub fn repository(&self) -> &'static str {
        self.url.trim_end_matches('/').rsplit('/').next().unwrap_or("")
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.name, self.purpose, self.url)
    }
}

/// The CnQuant tool index.
pub const TOOLS: &[Tool] = &[
    Tool {
        name: "CQcalc",
        purpose: "Copy-number variation calculator",
        url: "https://github.com/neuropathbasel-pub/CQcalc",
    },
    Tool {
        name: "CQall",
        purpose: "Batch execution of CNV calculations",
        url: "https://github.com/neuropathbasel-pub/CQall",
    },
    Tool {
        name: "CQall plotter",
        purpose: "Summary plots across a cohort",
        url: "https://github.com/neuropathbasel-pub/CQall_plotter",
    },
    Tool {
        name: "CQcase",
        purpose: "Single-case CNV viewer",
        url: "https://github.com/neuropathbasel-pub/CQcase",
    },
    Tool {
        name: "CQmanager",
        purpose: "Viewer for summary plots",
        url: "https://github.com/neuropathbasel-pub/CQmanager",
    },
];

/// Look up a tool by name, ignoring case.
#[must_use]
pub fn find_tool(name: &str) -> Option<&'static Tool> {
    TOOLS.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

/// Check that every tool links to a GitHub repository named after it.
///
/// Names are compared case-insensitively with spaces, `_` and `-` ignored,
/// so `CQall plotter` matches `CQall_plotter`.
///
/// # Errors
///
/// Returns [`Error::ConfigValidation`] naming the first inconsistent entry.
pub fn validate_index(tools: &[Tool]) -> Result<()> {
    let prefix = "https://github.com/";
    for tool in tools {
        let Some(path) = tool.url.strip_prefix(prefix) else {
            return Err(Error::config_validation(format!(
                "{}: URL {} is not a GitHub repository",
                tool.name, tool.url
            )));
        };
        if path.trim_end_matches('/').split('/').count() != 2 {
            return Err(Error::config_validation(format!(
                "{}: URL {} does not name an owner and a repository",
                tool.name, tool.url
            )));
        }
        if normalize(tool.repository()) != normalize(tool.name) {
            return Err(Error::config_validation(format!(
                "{}: repository {} does not match the tool name",
                tool.name,
                tool.repository()
            )));
        }
        if tool.purpose.trim().is_empty() {
            return Err(Error::config_validation(format!(
                "{}: missing purpose",
                tool.name
            )));
        }
    }
    Ok(())
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}
