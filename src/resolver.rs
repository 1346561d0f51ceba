// Picks the active child / preschool / year. The platform's profile lists
// every preschool the account can see (with its school years) and every
// child; the resolver narrows the resulting tuples down to one, asking the
// user only where there is a real choice.

use serde_json::{json, Value};

use crate::context::{Context, ContextStore};
use crate::error::{Error, Result};
use crate::queries;

/// One selectable value: an id plus what to show for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

impl Choice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Choice {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A complete, selectable context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub preschool: Choice,
    pub child: Choice,
    pub year: Choice,
}

impl Candidate {
    pub fn to_context(&self) -> Context {
        Context::new(&self.child.id, &self.preschool.id, &self.year.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preschool {
    pub choice: Choice,
    pub years: Vec<Choice>,
}

/// The parts of `me` the resolver cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub preschools: Vec<Preschool>,
    pub children: Vec<Choice>,
}

impl Profile {
    /// Read the `data` object of the candidates query. Entries without an id
    /// are skipped.
    pub fn from_graphql(data: &Value) -> Result<Self> {
        let me = data
            .get("me")
            .filter(|me| me.is_object())
            .ok_or_else(|| Error::UnexpectedResponse("profile response has no `me`".into()))?;

        let preschools = list(me, "availablePreschools")
            .filter_map(|p| {
                let choice = choice_of(p, &["name"])?;
                let years = p
                    .pointer("/years/edges")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(|edge| choice_of(edge.get("node")?, &["displayName", "name"]))
                    .collect();
                Some(Preschool { choice, years })
            })
            .collect();

        let children = list(me, "children")
            .filter_map(|c| {
                let mut child = choice_of(c, &["name"])?;
                if let Some(surname) = c.get("surname").and_then(Value::as_str) {
                    if !surname.is_empty() {
                        child.label = format!("{} {surname}", child.label).trim().to_string();
                    }
                }
                Some(child)
            })
            .collect();

        Ok(Profile {
            preschools,
            children,
        })
    }

    /// Distinct `{preschool, child, year}` tuples in profile order.
    pub fn candidates(&self) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = Vec::new();
        for preschool in &self.preschools {
            for child in &self.children {
                for year in &preschool.years {
                    let candidate = Candidate {
                        preschool: preschool.choice.clone(),
                        child: child.clone(),
                        year: year.clone(),
                    };
                    if !out.iter().any(|c| c.to_context() == candidate.to_context()) {
                        out.push(candidate);
                    }
                }
            }
        }
        out
    }
}

fn list<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn choice_of(value: &Value, label_keys: &[&str]) -> Option<Choice> {
    let id = match value.get("id")? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let label = label_keys
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| id.clone());
    Some(Choice { id, label })
}

/// Context level the chooser is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Preschool,
    Child,
    Year,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Preschool => "preschool",
            Level::Child => "child",
            Level::Year => "year",
        }
    }

    fn pick(self, candidate: &Candidate) -> &Choice {
        match self {
            Level::Preschool => &candidate.preschool,
            Level::Child => &candidate.child,
            Level::Year => &candidate.year,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks one of several options. Returns the index into `options`.
pub trait Chooser {
    fn choose(&self, level: Level, options: &[Choice]) -> Result<usize>;
}

/// Where the resolver gets the profile from.
pub trait ProfileSource {
    fn profile(&self) -> Result<Profile>;
}

/// GraphQL request the profile source sends.
pub fn profile_request() -> (&'static str, Value) {
    (queries::CONTEXT_CANDIDATES, json!({}))
}

pub struct ContextResolver<'a> {
    store: &'a ContextStore,
    chooser: &'a dyn Chooser,
}

impl<'a> ContextResolver<'a> {
    pub fn new(store: &'a ContextStore, chooser: &'a dyn Chooser) -> Self {
        ContextResolver { store, chooser }
    }

    /// Return `existing` when complete, otherwise select a context from the
    /// profile and persist it.
    pub fn resolve(
        &self,
        source: &dyn ProfileSource,
        existing: Option<Context>,
        force_change: bool,
    ) -> Result<Context> {
        if let Some(ctx) = existing.filter(|c| c.is_complete()) {
            if !force_change {
                tracing::debug!(?ctx, "using stored context");
                return Ok(ctx);
            }
        }

        let profile = source.profile()?;
        let candidates = profile.candidates();
        tracing::debug!(count = candidates.len(), "context candidates");
        let selected = self.select(candidates)?;

        let context = selected.to_context();
        self.store.save(&context)?;
        Ok(context)
    }

    fn select(&self, mut candidates: Vec<Candidate>) -> Result<Candidate> {
        if candidates.len() > 1 {
            for level in [Level::Preschool, Level::Child, Level::Year] {
                let mut options: Vec<Choice> = Vec::new();
                for candidate in &candidates {
                    let choice = level.pick(candidate);
                    if !options.iter().any(|o| o.id == choice.id) {
                        options.push(choice.clone());
                    }
                }
                if options.len() < 2 {
                    continue;
                }
                let index = self.chooser.choose(level, &options)?;
                let picked = options.get(index).ok_or_else(|| {
                    Error::InvalidInput(format!("no {level} option number {}", index + 1))
                })?;
                tracing::debug!(%level, id = %picked.id, "context level chosen");
                let picked_id = picked.id.clone();
                candidates.retain(|c| level.pick(c).id == picked_id);
            }
        }
        candidates.into_iter().next().ok_or(Error::NoContext)
    }
}
