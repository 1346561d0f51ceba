// The active child / preschool / school-year selection. The platform reads
// it from cookies, so this module also knows how to turn it into a
// `Cookie` header.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::JsonFile;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub child_id: Option<String>,
    #[serde(default)]
    pub preschool_id: Option<String>,
    #[serde(default)]
    pub year_id: Option<String>,
}

impl Context {
    pub fn new(
        child_id: impl Into<String>,
        preschool_id: impl Into<String>,
        year_id: impl Into<String>,
    ) -> Self {
        Context {
            child_id: Some(child_id.into()),
            preschool_id: Some(preschool_id.into()),
            year_id: Some(year_id.into()),
        }
    }

    /// All three ids present and non-empty.
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Names of the fields that are still unset.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("child", &self.child_id),
            ("preschool", &self.preschool_id),
            ("year", &self.year_id),
        ] {
            if value.as_deref().map_or(true, str::is_empty) {
                missing.push(name);
            }
        }
        missing
    }

    /// Replace the fields that `other` sets.
    pub fn overlay(mut self, other: &Context) -> Context {
        if other.child_id.is_some() {
            self.child_id = other.child_id.clone();
        }
        if other.preschool_id.is_some() {
            self.preschool_id = other.preschool_id.clone();
        }
        if other.year_id.is_some() {
            self.year_id = other.year_id.clone();
        }
        self
    }

    /// Error unless complete.
    pub fn require_complete(self) -> Result<Context> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(Error::IncompleteContext(self.missing().join(", ")))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.child_id.is_none() && self.preschool_id.is_none() && self.year_id.is_none()
    }
}

/// Cookie header carrying the context, e.g.
/// `active_child=C; active_year=Y; preschool=P; locale=pl`.
pub fn cookie_header(context: Option<&Context>, locale: &str) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(ctx) = context {
        for (name, value) in [
            ("active_child", &ctx.child_id),
            ("active_year", &ctx.year_id),
            ("preschool", &ctx.preschool_id),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                parts.push(format!("{name}={value}"));
            }
        }
    }
    if !locale.is_empty() {
        parts.push(format!("locale={locale}"));
    }
    (!parts.is_empty()).then(|| parts.join("; "))
}

/// Persisted context selection.
#[derive(Debug, Clone)]
pub struct ContextStore {
    file: JsonFile,
}

impl ContextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ContextStore {
            file: JsonFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The stored context, or `None` when missing, corrupt or incomplete.
    pub fn load(&self) -> Option<Context> {
        let context: Context = self.file.load()?;
        if context.is_complete() {
            Some(context)
        } else {
            tracing::debug!(missing = ?context.missing(), "stored context is incomplete, ignoring it");
            None
        }
    }

    pub fn save(&self, context: &Context) -> Result<()> {
        tracing::debug!(path = %self.path().display(), ?context, "saving context");
        self.file.save(context)
    }

    pub fn clear(&self) -> Result<()> {
        self.file.delete()
    }
}
