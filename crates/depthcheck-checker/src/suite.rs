//! Named collections of properties run together.

use std::fmt;

use depthcheck_generator::Registry;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::CheckConfig;
use crate::engine::check;
use crate::outcome::Outcome;
use crate::property::Property;

/// An ordered set of named properties.
#[derive(Debug, Clone)]
pub struct PropertySet {
    name: String,
    properties: Vec<(String, Property)>,
}

impl PropertySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Add a property. Its outcome path starts with `name`.
    pub fn with_property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.add(name, property);
        self
    }

    pub fn add(&mut self, name: impl Into<String>, property: Property) {
        self.properties.push((name.into(), property));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Property names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }

    /// Run every property in order at the configured depth.
    pub fn run(&self, registry: &Registry, config: &CheckConfig) -> SuiteReport {
        let mut results = Vec::with_capacity(self.properties.len());
        let mut skipped = Vec::new();

        for (name, property) in &self.properties {
            if config.fail_fast && results.iter().any(|r: &PropertyResult| r.outcome.is_failure()) {
                skipped.push(name.clone());
                continue;
            }
            let outcome = check(registry, &property.clone().named(name.clone()), config.depth);
            if outcome.is_failure() {
                warn!(suite = %self.name, property = %name, "Property failed");
            }
            results.push(PropertyResult {
                name: name.clone(),
                outcome,
            });
        }

        let report = SuiteReport {
            name: self.name.clone(),
            depth: config.depth,
            results,
            skipped,
        };
        info!(
            suite = %report.name,
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped.len(),
            "Property set finished"
        );
        report
    }
}

/// The outcome of one property in a set.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyResult {
    pub name: String,
    pub outcome: Outcome,
}

/// Outcomes of a [`PropertySet`] run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub depth: usize,
    pub results: Vec<PropertyResult>,
    /// Properties not run because an earlier one failed.
    pub skipped: Vec<String>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.results
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.outcome)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} at depth {}", self.name, self.depth)?;
        for result in &self.results {
            write!(f, "{}", result.outcome)?;
        }
        for name in &self.skipped {
            writeln!(f, "SKIP {}", name)?;
        }
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped.len()
        )
    }
}
