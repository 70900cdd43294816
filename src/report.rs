//! Console rendering of reconciliation results and registry searches.

use std::fmt::Write;

use crate::logic::reconcile::{Outcome, Reconciliation, ResolvedPackage};
use crate::sources::PkgInfo;

const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_CYAN: &str = "\x1b[1;36m";
const BOLD_WHITE: &str = "\x1b[1;37m";
const OFF: &str = "\x1b[0m";

/// Presentation status of one external package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportStatus {
    /// Installed version is current upstream.
    Current {
        /// Installed version.
        installed: String,
    },
    /// Upstream has a different, newer version.
    UpdateAvailable {
        /// Installed version.
        installed: String,
        /// Upstream version.
        remote: String,
    },
    /// The package could not be checked upstream.
    Missing {
        /// Human-readable cause.
        reason: String,
    },
}

/// One line of the final report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageReport {
    /// Package name.
    pub name: String,
    /// What happened to it.
    pub status: ReportStatus,
}

impl From<&ResolvedPackage> for PackageReport {
    fn from(p: &ResolvedPackage) -> Self {
        let installed = p.record.version.clone();
        let status = match &p.outcome {
            Outcome::Current => ReportStatus::Current { installed },
            Outcome::UpdateAvailable { remote_version } => ReportStatus::UpdateAvailable {
                installed,
                remote: remote_version.clone(),
            },
            Outcome::LookupFailed { cause } => ReportStatus::Missing {
                reason: cause.to_string(),
            },
        };
        Self {
            name: p.record.name.clone(),
            status,
        }
    }
}

/// Rendering switches taken from the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit ANSI color codes.
    pub color: bool,
    /// Hide packages that are current.
    pub outdated_only: bool,
}

/// Wrap `text` in an ANSI style when color is enabled.
fn paint(text: &str, style: &str, color: bool) -> String {
    if color {
        format!("{style}{text}{OFF}")
    } else {
        text.to_string()
    }
}

/// What: Build the sorted report rows for a reconciliation.
///
/// Inputs:
/// - `result`: Completed reconciliation.
/// - `outdated_only`: Drop `Current` rows when set.
///
/// Output:
/// - Rows sorted by package name.
#[must_use]
pub fn build_reports(result: &Reconciliation, outdated_only: bool) -> Vec<PackageReport> {
    let mut rows: Vec<PackageReport> = result
        .packages
        .iter()
        .map(PackageReport::from)
        .filter(|r| !(outdated_only && matches!(r.status, ReportStatus::Current { .. })))
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

/// Render one report row.
#[must_use]
pub fn render_line(report: &PackageReport, color: bool) -> String {
    let name = paint(&report.name, BOLD_WHITE, color);
    match &report.status {
        ReportStatus::Current { installed } => {
            format!("{} {name} = {installed}", paint("[CURRENT]", BOLD_GREEN, color))
        }
        ReportStatus::UpdateAvailable { installed, remote } => format!(
            "{} {name} ({installed} {} {remote})",
            paint("[NEW VERSION]", BOLD_CYAN, color),
            paint("=>", BOLD_RED, color)
        ),
        ReportStatus::Missing { reason } => {
            format!("{} {name} ({reason})", paint("[MISSING]", BOLD_RED, color))
        }
    }
}

/// What: Render the full check report.
///
/// Inputs:
/// - `result`: Completed reconciliation.
/// - `opts`: Color and filtering switches.
///
/// Output:
/// - Report text with one line per package followed by a summary line.
///
/// Details:
/// - The summary always counts every package, even when rows are filtered.
#[must_use]
pub fn render_reconciliation(result: &Reconciliation, opts: RenderOptions) -> String {
    let mut out = String::new();
    for row in build_reports(result, opts.outdated_only) {
        let _ = writeln!(out, "{}", render_line(&row, opts.color));
    }
    let _ = writeln!(
        out,
        "{} external packages: {} current, {} with updates, {} missing",
        result.packages.len(),
        result.current(),
        result.outdated(),
        result.failed()
    );
    out
}

/// What: Render registry search results.
///
/// Inputs:
/// - `results`: Packages returned by the search, already sorted by name.
/// - `color`: Emit ANSI color codes.
///
/// Output:
/// - Two lines per package: `name version` with an out-of-date marker, then
///   the indented description.
#[must_use]
pub fn render_search(results: &[PkgInfo], color: bool) -> String {
    let mut out = String::new();
    for info in results {
        let flag = if info.out_of_date.is_some() {
            format!(" {}", paint("(Out-of-date)", BOLD_RED, color))
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "{} {} (+{} {:.2}){flag}",
            paint(&format!("aur/{}", info.name), BOLD_WHITE, color),
            paint(&info.version, BOLD_GREEN, color),
            info.num_votes,
            info.popularity
        );
        if let Some(desc) = info.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "    {desc}");
        }
    }
    out
}
