//! Site manifest: the page list, shared fragments, check rules and rewrite jobs.
//!
//! ```toml
//! pages = ["index.html", "about.html"]
//!
//! [fragments]
//! header = "standard-header.html"
//!
//! [[checks]]
//! name = "mobile menu"
//! all_of = ["vs-menu-wrapper"]
//!
//! [[jobs.auth.steps]]
//! kind = "insert_before"
//! anchor = "</head>"
//! text = "<script src=\"assets/js/auth.js\"></script>"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::error::SiteError;

/// `{{name}}` references to fragments inside step text
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Pages relative to the site root, in processing order
    #[serde(default)]
    pub pages: Vec<String>,
    /// Fragment name -> file relative to the site root
    #[serde(default)]
    pub fragments: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub checks: Vec<CheckRule>,
    #[serde(default)]
    pub jobs: BTreeMap<String, JobSpec>,
}

/// A rule passes when every `all_of` entry is a substring of the page.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckRule {
    pub name: String,
    pub all_of: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSpec {
    pub description: Option<String>,
    /// Overrides the top-level page list
    pub pages: Option<Vec<String>>,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// One edit applied to a page, selected by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum StepSpec {
    ReplacePattern {
        label: Option<String>,
        patterns: Vec<String>,
        text: String,
    },
    ReplaceBetween {
        label: Option<String>,
        start: String,
        end: String,
        text: String,
    },
    InsertBefore {
        label: Option<String>,
        anchor: String,
        text: String,
        unless_contains: Option<String>,
    },
    InsertAfterPattern {
        label: Option<String>,
        pattern: String,
        text: String,
        unless_contains: Option<String>,
    },
}

impl StepSpec {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ReplacePattern { .. } => "replace_pattern",
            Self::ReplaceBetween { .. } => "replace_between",
            Self::InsertBefore { .. } => "insert_before",
            Self::InsertAfterPattern { .. } => "insert_after_pattern",
        }
    }

    /// Name used in status lines, falls back to the kind
    pub fn label(&self) -> &str {
        let label = match self {
            Self::ReplacePattern { label, .. }
            | Self::ReplaceBetween { label, .. }
            | Self::InsertBefore { label, .. }
            | Self::InsertAfterPattern { label, .. } => label.as_deref(),
        };
        label.unwrap_or_else(|| self.kind())
    }

    /// Step text and guard, the only fields placeholders are expanded in
    fn expandable(&self) -> impl Iterator<Item = &str> {
        let (text, guard) = match self {
            Self::ReplacePattern { text, .. } | Self::ReplaceBetween { text, .. } => (text, None),
            Self::InsertBefore {
                text,
                unless_contains,
                ..
            }
            | Self::InsertAfterPattern {
                text,
                unless_contains,
                ..
            } => (text, unless_contains.as_deref()),
        };
        [Some(text.as_str()), guard].into_iter().flatten()
    }
}

impl JobSpec {
    /// Fragment names referenced as `{{name}}` by any step
    pub fn placeholders(&self) -> BTreeSet<String> {
        self.steps
            .iter()
            .flat_map(StepSpec::expandable)
            .flat_map(|text| PLACEHOLDER.captures_iter(text))
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, SiteError> {
        let content = fs::read_to_string(path).map_err(|e| SiteError::read(path, e))?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, SiteError> {
        toml::from_str(content).map_err(|source| SiteError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Pages ending in `suffix`, with the suffix stripped.
    pub fn page_slugs(&self, suffix: &str) -> Vec<String> {
        self.pages
            .iter()
            .filter_map(|page| page.strip_suffix(suffix))
            .filter(|slug| !slug.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn job(&self, name: &str) -> Result<&JobSpec, SiteError> {
        self.jobs
            .get(name)
            .ok_or_else(|| SiteError::UnknownJob(name.to_string()))
    }

    /// Pages a job runs on
    pub fn pages_for<'a>(&'a self, job: &'a JobSpec) -> &'a [String] {
        job.pages.as_deref().unwrap_or(&self.pages)
    }

    /// Read the fragment files `job` references, below `root`.
    ///
    /// Undeclared names are skipped here and rejected when the job compiles.
    pub fn load_fragments(&self, root: &Path, job: &JobSpec) -> Result<Fragments, SiteError> {
        let mut fragments = Fragments::default();
        for name in job.placeholders() {
            let Some(file) = self.fragments.get(&name) else {
                continue;
            };
            let path = root.join(file);
            let text = fs::read_to_string(&path).map_err(|e| SiteError::read(&path, e))?;
            fragments.insert(name, text);
        }
        Ok(fragments)
    }
}

/// Loaded fragment texts, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Fragments(BTreeMap<String, String>);

impl Fragments {
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.0.insert(name.into(), text.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Replace every `{{name}}` in `text` with the fragment's content.
    ///
    /// Expansion is single pass: placeholders inside fragment text are kept
    /// as written.
    pub fn expand(&self, job: &str, text: &str) -> Result<String, SiteError> {
        if let Some(caps) = PLACEHOLDER
            .captures_iter(text)
            .find(|caps| self.get(&caps[1]).is_none())
        {
            return Err(SiteError::UnknownFragment {
                job: job.to_string(),
                name: caps[1].to_string(),
            });
        }

        let expanded = PLACEHOLDER.replace_all(text, |caps: &Captures| {
            self.get(&caps[1]).unwrap_or_default().to_string()
        });
        Ok(expanded.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
pages = ["index.html", "spectacles.html", "404.html", "assets/app.js"]

[fragments]
header = "standard-header.html"

[[checks]]
name = "standard navigation"
all_of = ["ACCUEIL", "SPECTACLES"]

[jobs.headers]
description = "Standardize CSS includes"

[[jobs.headers.steps]]
kind = "replace_pattern"
label = "CSS includes"
patterns = ['<!-- Bootstrap -->.*?style\.css">']
text = "{{header}}"

[[jobs.headers.steps]]
kind = "insert_before"
anchor = "</head>"
text = "<style></style>"

[jobs.auth]
pages = ["index.html"]

[[jobs.auth.steps]]
kind = "insert_after_pattern"
pattern = "<body[^>]*>"
text = "<div id=\"auth\"></div>"
unless_contains = "id=\"auth\""
"#;

    fn sample() -> Manifest {
        Manifest::parse(SAMPLE, Path::new("site.toml")).unwrap()
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = sample();
        assert_eq!(manifest.pages.len(), 4);
        assert_eq!(
            manifest.fragments.get("header"),
            Some(&PathBuf::from("standard-header.html"))
        );
        assert_eq!(manifest.checks[0].all_of, vec!["ACCUEIL", "SPECTACLES"]);

        let headers = manifest.job("headers").unwrap();
        assert_eq!(headers.steps.len(), 2);
        assert_eq!(headers.steps[0].label(), "CSS includes");
        assert_eq!(headers.steps[1].label(), "insert_before");
        assert!(matches!(
            headers.steps[1],
            StepSpec::InsertBefore { unless_contains: None, .. }
        ));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = Manifest::parse("pages = []\ntemplates = []\n", Path::new("site.toml"));
        assert!(matches!(err, Err(SiteError::Manifest { .. })));

        let err = Manifest::parse(
            "[[jobs.x.steps]]\nkind = \"insert_before\"\nanchor = \"a\"\ntext = \"b\"\nextra = 1\n",
            Path::new("site.toml"),
        );
        assert!(matches!(err, Err(SiteError::Manifest { .. })));
    }

    #[test]
    fn test_unknown_step_kind_rejected() {
        let err = Manifest::parse(
            "[[jobs.x.steps]]\nkind = \"delete_everything\"\n",
            Path::new("site.toml"),
        );
        assert!(matches!(err, Err(SiteError::Manifest { .. })));
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::parse("", Path::new("site.toml")).unwrap();
        assert!(manifest.pages.is_empty());
        assert!(manifest.jobs.is_empty());
    }

    #[test]
    fn test_page_slugs() {
        assert_eq!(
            sample().page_slugs(".html"),
            vec!["index", "spectacles", "404"]
        );
    }

    #[test]
    fn test_job_pages_fall_back_to_manifest() {
        let manifest = sample();
        assert_eq!(manifest.pages_for(manifest.job("headers").unwrap()).len(), 4);
        assert_eq!(
            manifest.pages_for(manifest.job("auth").unwrap()),
            ["index.html".to_string()]
        );
        assert!(matches!(manifest.job("missing"), Err(SiteError::UnknownJob(name)) if name == "missing"));
    }

    #[test]
    fn test_placeholders_per_job() {
        let manifest = sample();
        let names: Vec<String> = manifest.job("headers").unwrap().placeholders().into_iter().collect();
        assert_eq!(names, vec!["header"]);
        assert!(manifest.job("auth").unwrap().placeholders().is_empty());
    }

    #[test]
    fn test_load_fragments() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("standard-header.html"), "<header>EDJS</header>").unwrap();

        let manifest = sample();
        let fragments = manifest
            .load_fragments(dir.path(), manifest.job("headers").unwrap())
            .unwrap();
        assert_eq!(fragments.get("header"), Some("<header>EDJS</header>"));
    }

    #[test]
    fn test_missing_fragment_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = sample();
        assert!(matches!(
            manifest.load_fragments(dir.path(), manifest.job("headers").unwrap()),
            Err(SiteError::Read { .. })
        ));
    }

    #[test]
    fn test_unused_fragment_file_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = sample();
        let fragments = manifest
            .load_fragments(dir.path(), manifest.job("auth").unwrap())
            .unwrap();
        assert!(fragments.get("header").is_none());
    }

    #[test]
    fn test_guard_placeholders_collected() {
        let job: JobSpec = toml::from_str(
            "[[steps]]\nkind = \"insert_before\"\nanchor = \"</body>\"\ntext = \"{{ scripts }}\"\nunless_contains = \"{{marker}}\"\n",
        )
        .unwrap();
        let names: Vec<String> = job.placeholders().into_iter().collect();
        assert_eq!(names, vec!["marker", "scripts"]);
    }

    #[test]
    fn test_expand_placeholders() {
        let mut fragments = Fragments::default();
        fragments.insert("header", "<header/>");
        fragments.insert("footer", "<footer/>");

        assert_eq!(
            fragments.expand("job", "{{header}}\n<main/>\n{{ footer }}").unwrap(),
            "<header/>\n<main/>\n<footer/>"
        );
        assert_eq!(fragments.expand("job", "no refs").unwrap(), "no refs");
    }

    #[test]
    fn test_expand_unknown_fragment() {
        let fragments = Fragments::default();
        let err = fragments.expand("headers", "{{nav}}").unwrap_err();
        assert!(matches!(
            err,
            SiteError::UnknownFragment { ref job, ref name } if job == "headers" && name == "nav"
        ));
    }
}
