// src/manifest.rs

//! Dependency manifest (requirements file) parsing.
//!
//! The installer itself consumes the file; launchpad parses it up front so
//! that malformed lines, duplicates and unpinned requirements are reported
//! before any package is touched.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::errors::{LaunchpadError, Result};
use crate::fs::FileSystem;

static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[(?P<extras>[^\]]*)\])?\s*(?P<rest>.*)$",
    )
    .expect("requirement regex is valid")
});

static CONSTRAINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:===|==|!=|~=|<=|>=|<|>)\s*[A-Za-z0-9.*+!_-]+$")
        .expect("constraint regex is valid")
});

static NORMALIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("normalize regex is valid"));

/// Version constraint attached to a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// No constraint at all (`django`).
    Any,
    /// Comma-separated specifier clauses (`django>=4.2,<5`).
    Specifier(Vec<String>),
    /// Direct reference (`pkg @ https://...`).
    Url(String),
}

impl VersionConstraint {
    /// A constraint is pinned when it selects exactly one artifact: a single
    /// `==`/`===` clause without wildcards, or a direct reference.
    pub fn is_pinned(&self) -> bool {
        match self {
            VersionConstraint::Any => false,
            VersionConstraint::Url(_) => true,
            VersionConstraint::Specifier(clauses) => {
                clauses.len() == 1
                    && (clauses[0].starts_with("==") || clauses[0].starts_with("==="))
                    && !clauses[0].contains('*')
            }
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Any => Ok(()),
            VersionConstraint::Specifier(clauses) => f.write_str(&clauses.join(",")),
            VersionConstraint::Url(url) => write!(f, " @ {url}"),
        }
    }
}

/// One `(name, version_constraint)` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
    pub constraint: VersionConstraint,
    pub marker: Option<String>,
    /// 1-based line the requirement starts on.
    pub line: usize,
}

impl Requirement {
    /// Name normalised for comparison: lowercase, runs of `-_.` folded to `-`.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        write!(f, "{}", self.constraint)?;
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

pub fn normalize_name(name: &str) -> String {
    NORMALIZE_RE.replace_all(&name.to_lowercase(), "-").into_owned()
}

/// Parsed manifest: requirements and installer options, each in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub entries: Vec<Requirement>,
    pub options: Vec<String>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Requirement> {
        let wanted = normalize_name(name);
        self.entries.iter().find(|r| r.normalized_name() == wanted)
    }

    pub fn unpinned(&self) -> impl Iterator<Item = &Requirement> {
        self.entries.iter().filter(|r| !r.constraint.is_pinned())
    }

    /// Fail on the first unpinned requirement when `require_pins` is set,
    /// otherwise log each one.
    pub fn check_pins(&self, require_pins: bool) -> Result<()> {
        for req in self.unpinned() {
            if require_pins {
                return Err(LaunchpadError::Manifest {
                    line: req.line,
                    message: format!("requirement '{req}' is not pinned to an exact version"),
                });
            }
            warn!(requirement = %req, line = req.line, "unpinned requirement");
        }
        Ok(())
    }
}

/// Read and parse a manifest file.
pub fn load_manifest(fs: &dyn FileSystem, path: &Path) -> Result<Manifest> {
    let contents = fs.read_to_string(path)?;
    let manifest = parse_manifest(&contents)?;
    debug!(
        path = ?path,
        requirements = manifest.len(),
        options = manifest.options.len(),
        "parsed dependency manifest"
    );
    Ok(manifest)
}

/// Parse requirements-file text.
pub fn parse_manifest(contents: &str) -> Result<Manifest> {
    let mut manifest = Manifest::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (line_no, logical) in logical_lines(contents) {
        let text = strip_comment(&logical);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        if text.starts_with('-') {
            manifest.options.push(text.to_string());
            continue;
        }

        let req = parse_requirement(text, line_no)?;
        let key = req.normalized_name();
        if let Some(first) = seen.get(&key) {
            return Err(LaunchpadError::Manifest {
                line: line_no,
                message: format!(
                    "duplicate requirement '{}' (first declared on line {})",
                    req.name, first
                ),
            });
        }
        seen.insert(key, line_no);
        manifest.entries.push(req);
    }

    Ok(manifest)
}

/// Join `\` continuations, keeping the line number where each logical line
/// starts.
fn logical_lines(contents: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let (start, mut buf) = pending.take().unwrap_or((line_no, String::new()));

        match raw.trim_end().strip_suffix('\\') {
            Some(head) => {
                buf.push_str(head);
                buf.push(' ');
                pending = Some((start, buf));
            }
            None => {
                buf.push_str(raw);
                out.push((start, buf));
            }
        }
    }

    if let Some(last) = pending {
        out.push(last);
    }
    out
}

/// Drop a `#` comment. Inside a requirement the `#` must follow whitespace,
/// so URL fragments (`...#egg=name`) survive.
fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return &line[..i];
        }
    }
    line
}

fn parse_requirement(text: &str, line: usize) -> Result<Requirement> {
    let manifest_err = |message: String| LaunchpadError::Manifest { line, message };

    let (body, marker) = match text.split_once(';') {
        Some((body, marker)) => (body.trim(), Some(marker.trim().to_string())),
        None => (text, None),
    };
    if matches!(marker.as_deref(), Some("")) {
        return Err(manifest_err(format!("empty environment marker in '{text}'")));
    }

    let caps = REQUIREMENT_RE
        .captures(body)
        .ok_or_else(|| manifest_err(format!("cannot parse requirement '{text}'")))?;

    let name = caps["name"].to_string();
    let extras = caps
        .name("extras")
        .map(|m| {
            m.as_str()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let rest = caps["rest"].trim();

    let constraint = if rest.is_empty() {
        VersionConstraint::Any
    } else if let Some(url) = rest.strip_prefix('@') {
        let url = url.trim();
        if url.is_empty() {
            return Err(manifest_err(format!("missing URL after '@' in '{text}'")));
        }
        VersionConstraint::Url(url.to_string())
    } else {
        let clauses: Vec<String> = rest
            .split(',')
            .map(|c| c.split_whitespace().collect::<String>())
            .collect();
        if let Some(bad) = clauses.iter().find(|c| !CONSTRAINT_RE.is_match(c)) {
            return Err(manifest_err(format!(
                "invalid version constraint '{bad}' for '{name}'"
            )));
        }
        VersionConstraint::Specifier(clauses)
    };

    Ok(Requirement {
        name,
        extras,
        constraint,
        marker,
        line,
    })
}
