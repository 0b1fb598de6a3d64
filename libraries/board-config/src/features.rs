// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Feature flag registry.
//!
//! Every board feature (`float`, `usb`, `uart1`, `repl`...) is a named flag holding either a
//! boolean or an enum value. Flags declare dependency edges on other flags, which are checked
//! when the registry is resolved: an enabled flag whose requirements are not met, or a cycle in
//! the dependency graph, makes the whole resolution fail.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::ConfigError;

/// Floating-point support in the firmware.
pub const FLOAT: &str = "float";
/// Numeric backend used for floats: `none`, `single` or `double`.
pub const FLOAT_IMPL: &str = "float_impl";
/// Peripheral carrying the REPL, or `none`.
pub const REPL: &str = "repl";
/// USB device support.
pub const USB: &str = "usb";

/// Value held by a feature flag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Choice(String),
}

impl FeatureValue {
    /// A boolean flag is enabled when `true`, an enum flag unless it is `none`.
    pub fn is_enabled(&self) -> bool {
        match self {
            FeatureValue::Bool(enabled) => *enabled,
            FeatureValue::Choice(choice) => !choice.eq_ignore_ascii_case("none"),
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            FeatureValue::Choice(choice) => Some(choice),
            FeatureValue::Bool(_) => None,
        }
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Bool(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Choice(value.to_string())
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Bool(value) => write!(f, "{}", value),
            FeatureValue::Choice(choice) => write!(f, "{}", choice),
        }
    }
}

/// Accepted value(s) of a dependency target.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    Is(FeatureValue),
    AnyOf(Vec<FeatureValue>),
}

impl Requirement {
    pub fn is_satisfied_by(&self, value: &FeatureValue) -> bool {
        match self {
            Requirement::Is(required) => required == value,
            Requirement::AnyOf(accepted) => accepted.contains(value),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Is(value) => write!(f, "{}", value),
            Requirement::AnyOf(values) => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{}", values.join("|"))
            }
        }
    }
}

/// Dependency edge: the target feature must hold a value accepted by the requirement.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dependency {
    pub feature: String,
    pub requirement: Requirement,
}

impl Dependency {
    pub fn new(feature: &str, requirement: Requirement) -> Self {
        Self {
            feature: feature.to_string(),
            requirement,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` = {}", self.feature, self.requirement)
    }
}

/// A resolved feature flag.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FeatureFlag {
    pub name: String,
    pub value: FeatureValue,
    pub depends_on: Vec<Dependency>,
}

/// Validated set of feature flags, ordered by name.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
#[serde(transparent)]
pub struct FeatureSet {
    flags: BTreeMap<String, FeatureFlag>,
}

impl FeatureSet {
    pub fn get(&self, name: &str) -> Option<&FeatureFlag> {
        self.flags.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&FeatureValue> {
        self.flags.get(name).map(|flag| &flag.value)
    }

    /// Absent flags are disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.value(name).is_some_and(FeatureValue::is_enabled)
    }

    pub fn enabled(&self) -> BTreeSet<String> {
        self.flags
            .values()
            .filter(|flag| flag.value.is_enabled())
            .map(|flag| flag.name.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureFlag> {
        self.flags.values()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

/// Declared feature flags and their dependency edges.
#[derive(Debug, Default, Clone)]
pub struct FeatureRegistry {
    flags: BTreeMap<String, FeatureValue>,
    dependencies: BTreeMap<String, Vec<Dependency>>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag, or overwrite its value if it already exists.
    pub fn register(&mut self, name: &str, value: impl Into<FeatureValue>) {
        self.flags.insert(name.to_string(), value.into());
    }

    /// Record that `name` requires `requires` whenever `name` is enabled.
    ///
    /// Edges may be declared before the flag itself is registered.
    pub fn declare_dependency(&mut self, name: &str, requires: Dependency) {
        let edges = self.dependencies.entry(name.to_string()).or_default();
        if !edges.contains(&requires) {
            edges.push(requires);
        }
    }

    pub fn value(&self, name: &str) -> Option<&FeatureValue> {
        self.flags.get(name)
    }

    /// Check every dependency edge and produce the validated flag set.
    ///
    /// # Errors
    ///
    /// + [`ConfigError::DependencyCycle`]: the declared edges contain a cycle
    /// + [`ConfigError::UnsatisfiedDependency`]: an enabled flag requires a flag that is absent or
    /// holds a non-accepted value
    pub fn resolve(&self) -> Result<FeatureSet, ConfigError> {
        if let Some(flags) = self.find_cycle() {
            return Err(ConfigError::DependencyCycle { flags });
        }

        for (name, value) in &self.flags {
            if !value.is_enabled() {
                continue;
            }
            for dependency in self.dependencies.get(name).into_iter().flatten() {
                let satisfied = self
                    .flags
                    .get(&dependency.feature)
                    .is_some_and(|target| dependency.requirement.is_satisfied_by(target));
                if !satisfied {
                    return Err(ConfigError::UnsatisfiedDependency {
                        flag: name.clone(),
                        requirement: dependency.clone(),
                    });
                }
            }
        }

        let flags = self
            .flags
            .iter()
            .map(|(name, value)| {
                let flag = FeatureFlag {
                    name: name.clone(),
                    value: value.clone(),
                    depends_on: self.dependencies.get(name).cloned().unwrap_or_default(),
                };
                (name.clone(), flag)
            })
            .collect();
        Ok(FeatureSet { flags })
    }

    // Depth-first search over the dependency edges. Returns the flags on the first cycle found,
    // starting from the flag where the cycle was entered.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visits = BTreeMap::new();
        let mut path = Vec::new();
        self.dependencies
            .keys()
            .find_map(|start| self.visit(start, &mut visits, &mut path))
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        visits: &mut BTreeMap<&'a str, Visit>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match visits.get(node) {
            Some(Visit::Done) => return None,
            Some(Visit::InProgress) => {
                let start = path.iter().position(|visited| *visited == node)?;
                return Some(path[start..].iter().map(|flag| flag.to_string()).collect());
            }
            None => {}
        }

        visits.insert(node, Visit::InProgress);
        path.push(node);
        for dependency in self.dependencies.get(node).into_iter().flatten() {
            if let Some(cycle) = self.visit(&dependency.feature, visits, path) {
                return Some(cycle);
            }
        }
        path.pop();
        visits.insert(node, Visit::Done);
        None
    }
}
