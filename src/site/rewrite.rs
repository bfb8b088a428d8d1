//! Batch rewriter
//!
//! A job is compiled once into a [`RewritePlan`] (patterns built, fragment
//! placeholders expanded), then applied to each page in order.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use regex::{Captures, NoExpand, Regex, RegexBuilder};

use super::manifest::{Fragments, JobSpec, Manifest, StepSpec};
use crate::error::SiteError;

/// Result of applying one step to one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Updated,
    AlreadyPresent,
    Unchanged,
    NotFound,
}

#[derive(Debug)]
enum Operation {
    ReplacePattern {
        patterns: Vec<Regex>,
        text: String,
    },
    ReplaceBetween {
        start: String,
        end: String,
        text: String,
    },
    InsertBefore {
        anchor: String,
        text: String,
        guard: String,
    },
    InsertAfterPattern {
        pattern: Regex,
        text: String,
        guard: String,
    },
}

#[derive(Debug)]
struct Step {
    label: String,
    operation: Operation,
}

/// A job ready to run against page content
#[derive(Debug)]
pub struct RewritePlan {
    job: String,
    steps: Vec<Step>,
}

/// Per-job totals
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteSummary {
    pub written: usize,
    pub unchanged: usize,
    pub missing: usize,
}

impl fmt::Display for RewriteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} page(s) updated, {} unchanged, {} not found",
            self.written, self.unchanged, self.missing
        )
    }
}

fn compile_pattern(job: &str, pattern: &str) -> Result<Regex, SiteError> {
    RegexBuilder::new(pattern)
        .dot_matches_new_line(true)
        .build()
        .map_err(|source| SiteError::Pattern {
            job: job.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

impl RewritePlan {
    pub fn compile(job: &str, spec: &JobSpec, fragments: &Fragments) -> Result<Self, SiteError> {
        let steps = spec
            .steps
            .iter()
            .map(|step| -> Result<Step, SiteError> {
                let operation = match step {
                    StepSpec::ReplacePattern { patterns, text, .. } => Operation::ReplacePattern {
                        patterns: patterns
                            .iter()
                            .map(|p| compile_pattern(job, p))
                            .collect::<Result<_, _>>()?,
                        text: fragments.expand(job, text)?,
                    },
                    StepSpec::ReplaceBetween {
                        start, end, text, ..
                    } => Operation::ReplaceBetween {
                        start: start.clone(),
                        end: end.clone(),
                        text: fragments.expand(job, text)?,
                    },
                    StepSpec::InsertBefore {
                        anchor,
                        text,
                        unless_contains,
                        ..
                    } => {
                        let text = fragments.expand(job, text)?;
                        Operation::InsertBefore {
                            anchor: anchor.clone(),
                            guard: guard_for(job, unless_contains.as_deref(), &text, fragments)?,
                            text,
                        }
                    }
                    StepSpec::InsertAfterPattern {
                        pattern,
                        text,
                        unless_contains,
                        ..
                    } => {
                        let text = fragments.expand(job, text)?;
                        Operation::InsertAfterPattern {
                            pattern: compile_pattern(job, pattern)?,
                            guard: guard_for(job, unless_contains.as_deref(), &text, fragments)?,
                            text,
                        }
                    }
                };
                Ok(Step {
                    label: step.label().to_string(),
                    operation,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            job: job.to_string(),
            steps,
        })
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    /// Apply every step in order, returning the new content and one
    /// `(label, outcome)` pair per step.
    pub fn apply<'a>(&'a self, content: &str) -> (String, Vec<(&'a str, StepOutcome)>) {
        let mut current = content.to_string();
        let mut outcomes = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let (next, outcome) = step.operation.apply(&current);
            if let Some(next) = next {
                current = next;
            }
            outcomes.push((step.label.as_str(), outcome));
        }

        (current, outcomes)
    }
}

fn guard_for(
    job: &str,
    unless_contains: Option<&str>,
    text: &str,
    fragments: &Fragments,
) -> Result<String, SiteError> {
    match unless_contains {
        Some(guard) => fragments.expand(job, guard),
        None => Ok(text.to_string()),
    }
}

impl Operation {
    /// Returns the rewritten content when the step changed it.
    fn apply(&self, content: &str) -> (Option<String>, StepOutcome) {
        match self {
            Self::ReplacePattern { patterns, text } => {
                let Some(pattern) = patterns.iter().find(|p| p.is_match(content)) else {
                    return (None, StepOutcome::NotFound);
                };
                let replaced = pattern.replace_all(content, NoExpand(text.as_str()));
                changed_or_unchanged(content, replaced.into_owned())
            }
            Self::ReplaceBetween { start, end, text } => {
                let Some(begin) = content.find(start.as_str()) else {
                    return (None, StepOutcome::NotFound);
                };
                let search_from = begin + start.len();
                let Some(offset) = content[search_from..].find(end.as_str()) else {
                    return (None, StepOutcome::NotFound);
                };
                let finish = search_from + offset + end.len();
                let replaced = format!("{}{text}{}", &content[..begin], &content[finish..]);
                changed_or_unchanged(content, replaced)
            }
            Self::InsertBefore {
                anchor,
                text,
                guard,
            } => {
                if content.contains(guard.as_str()) {
                    return (None, StepOutcome::AlreadyPresent);
                }
                if !content.contains(anchor.as_str()) {
                    return (None, StepOutcome::NotFound);
                }
                let inserted = content.replace(anchor.as_str(), &format!("{text}\n{anchor}"));
                (Some(inserted), StepOutcome::Updated)
            }
            Self::InsertAfterPattern {
                pattern,
                text,
                guard,
            } => {
                if content.contains(guard.as_str()) {
                    return (None, StepOutcome::AlreadyPresent);
                }
                if !pattern.is_match(content) {
                    return (None, StepOutcome::NotFound);
                }
                let inserted = pattern.replace_all(content, |caps: &Captures| {
                    format!("{}\n{text}", &caps[0])
                });
                (Some(inserted.into_owned()), StepOutcome::Updated)
            }
        }
    }
}

fn changed_or_unchanged(before: &str, after: String) -> (Option<String>, StepOutcome) {
    if after == before {
        (None, StepOutcome::Unchanged)
    } else {
        (Some(after), StepOutcome::Updated)
    }
}

fn status_line(label: &str, outcome: StepOutcome) -> String {
    match outcome {
        StepOutcome::Updated => format!("  ✓ Updated {label}"),
        StepOutcome::AlreadyPresent => format!("  · {label} already present"),
        StepOutcome::Unchanged => format!("  = {label} unchanged"),
        StepOutcome::NotFound => format!("  ⚠ Could not find {label}"),
    }
}

/// Print the jobs a manifest defines.
pub fn list_jobs(manifest: &Manifest) {
    if manifest.jobs.is_empty() {
        println!("No rewrite jobs defined.");
        return;
    }
    println!("Available rewrite jobs:");
    for (name, job) in &manifest.jobs {
        let pages = manifest.pages_for(job).len();
        match &job.description {
            Some(description) => println!("  {name:<16} {description} ({pages} pages)"),
            None => println!("  {name:<16} ({pages} pages)"),
        }
    }
}

/// Run the named job over its pages below `root`.
///
/// Pages are overwritten only when their content changed, never with
/// `dry_run`. A missing page is reported and skipped; any other I/O error
/// stops the run.
pub fn run_rewrite(
    root: &Path,
    manifest: &Manifest,
    job_name: &str,
    dry_run: bool,
) -> Result<RewriteSummary, SiteError> {
    let spec = manifest.job(job_name)?;
    let fragments = manifest.load_fragments(root, spec)?;
    let plan = RewritePlan::compile(job_name, spec, &fragments)?;

    println!("Running rewrite job `{}`", plan.job());
    if let Some(description) = &spec.description {
        println!("{description}");
    }
    println!("{}", "=".repeat(50));

    let mut summary = RewriteSummary::default();
    for page in manifest.pages_for(spec) {
        let path = root.join(page);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                println!("✗ File not found: {page}");
                summary.missing += 1;
                continue;
            }
            Err(e) => return Err(SiteError::read(&path, e)),
        };

        println!("Processing: {page}");
        let (rewritten, outcomes) = plan.apply(&content);
        for (label, outcome) in outcomes {
            println!("{}", status_line(label, outcome));
        }

        if rewritten == content {
            summary.unchanged += 1;
            continue;
        }
        summary.written += 1;
        if dry_run {
            println!("  (dry run) {page} not written");
        } else {
            fs::write(&path, rewritten).map_err(|e| SiteError::write(&path, e))?;
        }
    }

    println!();
    println!("{summary}");
    Ok(summary)
}
