//! Build success evaluation
//!
//! Build scripts that pipe `xcodebuild` through a formatter lose the real
//! exit status, so they append `EXIT CODE: <n>` to the output. By default
//! the process exit status is used; the marker is an opt-in fallback.

use crate::executor::CommandOutput;
use buildkit_foundation::Error;
use std::str::FromStr;

/// Prefix of the exit code line appended by wrapper scripts
pub const EXIT_MARKER: &str = "EXIT CODE:";

/// Where the build result comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitStatusSource {
    /// Exit status of the build process
    #[default]
    Process,

    /// Last `EXIT CODE: <n>` line of the output
    Marker,
}

impl FromStr for ExitStatusSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "process" => Ok(Self::Process),
            "marker" => Ok(Self::Marker),
            other => Err(Error::Config(format!(
                "exit_status must be \"process\" or \"marker\", got {:?}",
                other
            ))),
        }
    }
}

/// Exit code from the last marker line of `output`, if any
pub fn parse_exit_marker(output: &str) -> Option<i32> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix(EXIT_MARKER))
        .filter_map(|code| code.trim().parse().ok())
        .last()
}

/// Exit code the success decision is based on
pub fn build_exit_code(source: ExitStatusSource, output: &CommandOutput) -> Option<i32> {
    match source {
        ExitStatusSource::Process => output.exit_code,
        ExitStatusSource::Marker => parse_exit_marker(&output.combined),
    }
}

/// Zero means success; anything else, or no code at all, is a failure
pub fn build_succeeded(source: ExitStatusSource, output: &CommandOutput) -> bool {
    build_exit_code(source, output) == Some(0)
}
