use std::process::Command;

use anyhow::bail;
use log::{debug, info};
use semver::{Version, VersionReq};

/// Oldest bcftools able to do region view, -m - normalization and TGT query
pub const REQUIRED_BCFTOOLS_VER: &str = ">=1.5";

/// Check that bcftools is installed and recent enough. Returns the installed
/// version so callers can report it.
pub fn check_bcftools() -> anyhow::Result<Version> {
    debug!("Checking for bcftools");
    let req = VersionReq::parse(REQUIRED_BCFTOOLS_VER).unwrap();

    let output = match Command::new("bcftools").arg("--version").output() {
        Ok(output) => output,
        Err(_) => bail!("bcftools is either not installed or not in PATH"),
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first_line = stdout.lines().next().unwrap_or("");
    let version = match parse_toolkit_version(first_line) {
        Some(version) => version,
        None => bail!(
            "could not parse bcftools version from '{}'; need bcftools {}",
            first_line,
            REQUIRED_BCFTOOLS_VER
        ),
    };

    if req.matches(&version) {
        info!("bcftools version {} running", version);
        Ok(version)
    } else {
        bail!(
            "bcftools must be {}. Current version: {}",
            REQUIRED_BCFTOOLS_VER,
            version
        );
    }
}

/// Parse the version out of a toolkit banner line such as "bcftools 1.19".
/// Release builds print two components and dev builds append "-g<hash>"
/// suffixes, neither of which is strict semver, so pad and trim accordingly.
pub fn parse_toolkit_version(line: &str) -> Option<Version> {
    let token = line.split_whitespace().last()?;
    let numeric: String = token
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut parts: Vec<&str> = numeric.split('.').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&parts.join(".")).ok()
}
