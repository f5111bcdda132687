//! Repository events and trigger matching

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Kind of repository event that can reach the runner
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A pull request was opened or updated
    PullRequest,
    /// A branch was pushed to
    Push,
    /// Any event kind the runner has no special knowledge of
    Other(String),
}

impl EventKind {
    /// Parse an event kind from its wire name (e.g. "pull_request")
    pub fn parse(s: &str) -> Self {
        match s {
            "pull_request" => EventKind::PullRequest,
            "push" => EventKind::Push,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// The wire name of this event kind
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::PullRequest => "pull_request",
            EventKind::Push => "push",
            EventKind::Other(s) => s,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of an incoming repository event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEvent {
    /// The event kind
    pub kind: EventKind,

    /// Activity type within the kind (e.g. "opened", "synchronize")
    pub activity: Option<String>,
}

impl RepoEvent {
    /// Create an event with no activity type
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            activity: None,
        }
    }

    /// Create an event with an activity type
    pub fn with_activity(kind: EventKind, activity: &str) -> Self {
        Self {
            kind,
            activity: Some(activity.to_string()),
        }
    }

    /// Parse an event descriptor from CLI input: `kind` or `kind:activity`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("Event descriptor is empty");
        }

        match s.split_once(':') {
            Some((kind, activity)) => {
                if activity.is_empty() {
                    bail!("Event descriptor '{}' has an empty activity type", s);
                }
                Ok(Self::with_activity(EventKind::parse(kind), activity))
            }
            None => Ok(Self::new(EventKind::parse(s))),
        }
    }
}

impl fmt::Display for RepoEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.activity {
            Some(activity) => write!(f, "{}:{}", self.kind, activity),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Activity-type filter for one declared event kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFilter {
    /// Activity types that activate the workflow; empty means all
    #[serde(default)]
    pub types: Vec<String>,
}

/// Declared triggers of a workflow
///
/// Accepts the three YAML shapes: a bare event name, a sequence of names,
/// or a mapping from name to an activity-type filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerConfig {
    /// `on: pull_request`
    Event(String),
    /// `on: [pull_request, push]`
    Events(Vec<String>),
    /// `on: { pull_request: { types: [opened, synchronize] } }`
    Filtered(HashMap<String, Option<EventFilter>>),
}

impl TriggerConfig {
    /// Whether the given event activates the workflow
    ///
    /// Unrecognized event kinds simply yield no match. No side effects.
    pub fn matches(&self, event: &RepoEvent) -> bool {
        let kind = event.kind.as_str();
        match self {
            TriggerConfig::Event(declared) => declared == kind,
            TriggerConfig::Events(declared) => declared.iter().any(|d| d == kind),
            TriggerConfig::Filtered(declared) => match declared.get(kind) {
                Some(Some(filter)) if !filter.types.is_empty() => match &event.activity {
                    Some(activity) => filter.types.iter().any(|t| t == activity),
                    None => false,
                },
                Some(_) => true,
                None => false,
            },
        }
    }

    /// The declared event kind names, sorted for stable output
    pub fn declared_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = match self {
            TriggerConfig::Event(e) => vec![e.clone()],
            TriggerConfig::Events(es) => es.clone(),
            TriggerConfig::Filtered(map) => map.keys().cloned().collect(),
        };
        kinds.sort();
        kinds
    }
}
