//! Consistency checker: reports which manifest pages fail which check rules.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use super::manifest::Manifest;
use crate::error::SiteError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum PageStatus {
    Pass,
    /// Names of the failed rules
    Incomplete { missing: Vec<String> },
    NotFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub page: String,
    #[serde(flatten)]
    pub status: PageStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub pages: Vec<PageReport>,
    pub consistent: bool,
}

impl CheckReport {
    /// Pages that are missing or fail at least one rule
    pub fn failing(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| p.status != PageStatus::Pass)
            .count()
    }
}

/// Check every manifest page below `root` against the manifest's rules.
pub fn run_check(root: &Path, manifest: &Manifest) -> Result<CheckReport, SiteError> {
    let mut pages = Vec::with_capacity(manifest.pages.len());

    for page in &manifest.pages {
        let path = root.join(page);
        let status = match fs::read_to_string(&path) {
            Ok(content) => {
                let missing: Vec<String> = manifest
                    .checks
                    .iter()
                    .filter(|rule| !rule.all_of.iter().all(|needle| content.contains(needle.as_str())))
                    .map(|rule| rule.name.clone())
                    .collect();
                if missing.is_empty() {
                    PageStatus::Pass
                } else {
                    PageStatus::Incomplete { missing }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => PageStatus::NotFound,
            Err(e) => return Err(SiteError::read(&path, e)),
        };
        pages.push(PageReport {
            page: page.clone(),
            status,
        });
    }

    let consistent = pages.iter().all(|p| p.status == PageStatus::Pass);
    Ok(CheckReport { pages, consistent })
}

/// Render the human-readable report.
pub fn format_report(report: &CheckReport) -> String {
    let mut lines = vec![
        "Site Consistency Check:".to_string(),
        "=".repeat(40),
    ];

    for page in &report.pages {
        match &page.status {
            PageStatus::Pass => lines.push(format!("✓ {}", page.page)),
            PageStatus::Incomplete { missing } => {
                lines.push(format!("⚠ {}", page.page));
                lines.extend(missing.iter().map(|name| format!("    - Missing {name}")));
            }
            PageStatus::NotFound => lines.push(format!("✗ {} - File not found", page.page)),
        }
    }

    lines.push(String::new());
    if report.consistent {
        lines.push(format!(
            "SUCCESS: All {} pages pass every check",
            report.pages.len()
        ));
    } else {
        lines.push(format!("⚠ {} page(s) still need updates", report.failing()));
    }
    lines.join("\n")
}
