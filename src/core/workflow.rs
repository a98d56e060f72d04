//! Workflow domain model
//!
//! A `Workflow` is the configuration tree handed to the emitter: jobs keyed by
//! id, each holding an ordered list of steps. Field names follow the CI
//! provider's schema through serde renames, and every map keeps insertion
//! order so the rendered file reads in the order it was assembled.

use crate::core::error::{GeneratorError, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// String-keyed map that serializes in insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing (in place) any value already under `key`
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Environment variables injected into a job or step
pub type Env = OrderedMap<String>;

/// Action inputs (`with:` block)
pub type Params = OrderedMap<String>;

/// A named collection of jobs run by the CI provider on its triggers
#[derive(Debug, Clone, serde::Serialize)]
pub struct Workflow {
    pub name: String,

    pub on: Triggers,

    pub jobs: OrderedMap<Job>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, on: Triggers) -> Self {
        Self {
            name: name.into(),
            on,
            jobs: OrderedMap::new(),
        }
    }

    /// Append a job; ids must be unique
    pub fn add_job(&mut self, id: impl Into<String>, job: Job) -> Result<()> {
        let id = id.into();
        if self.jobs.contains_key(&id) {
            return Err(GeneratorError::DuplicateJob(id));
        }
        self.jobs.insert(id, job);
        Ok(())
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    /// Ids of the jobs that list `id` in their `needs`
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.jobs
            .iter()
            .filter(|(_, job)| job.depends_on(id))
            .map(|(job_id, _)| job_id)
            .collect()
    }
}

/// Trigger conditions
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Triggers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<BranchFilter>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<BranchFilter>,
}

impl Triggers {
    /// Run on pushes and pull requests targeting `branch`
    pub fn branch(branch: impl Into<String>) -> Self {
        let filter = BranchFilter {
            branches: vec![branch.into()],
        };
        Self {
            push: Some(filter.clone()),
            pull_request: Some(filter),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BranchFilter {
    pub branches: Vec<String>,
}

/// A sequence of steps run in one isolated environment
#[derive(Debug, Clone, serde::Serialize)]
pub struct Job {
    pub name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,

    #[serde(rename = "runs-on")]
    pub runs_on: String,

    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_condition: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,

    #[serde(skip_serializing_if = "OrderedMap::is_empty")]
    pub env: Env,

    pub steps: Vec<Step>,
}

impl Job {
    pub fn new(name: impl Into<String>, runs_on: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            needs: Vec::new(),
            runs_on: runs_on.into(),
            if_condition: None,
            strategy: None,
            env: Env::new(),
            steps: Vec::new(),
        }
    }

    pub fn needs(mut self, job_id: impl Into<String>) -> Self {
        self.needs.push(job_id.into());
        self
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.if_condition = Some(condition.into());
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key, value.into());
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn depends_on(&self, job_id: &str) -> bool {
        self.needs.iter().any(|n| n == job_id)
    }

    /// Find a step by its `id`
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id.as_deref() == Some(id))
    }

    /// Whether some step downloads the artifact called `name`
    pub fn loads_artifact(&self, name: &str) -> bool {
        self.steps.iter().any(|s| {
            s.action_name() == Some(crate::generate::steps::DOWNLOAD_ARTIFACT_ACTION)
                && s.with.get("name").map(String::as_str) == Some(name)
        })
    }
}

/// Matrix strategy; `fail_fast` is passed through to the provider untouched
#[derive(Debug, Clone, serde::Serialize)]
pub struct Strategy {
    #[serde(rename = "fail-fast")]
    pub fail_fast: bool,

    pub matrix: Matrix,
}

/// Axis name to values; the provider runs one job instance per combination
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Matrix(OrderedMap<Vec<String>>);

impl Matrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.insert(name, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn axes(&self) -> impl Iterator<Item = (&str, &Vec<String>)> {
        self.0.iter()
    }

    pub fn values(&self, axis: &str) -> Option<&[String]> {
        self.0.get(axis).map(Vec::as_slice)
    }

    /// Number of job instances the provider will expand this matrix into
    pub fn instance_count(&self) -> usize {
        if self.0.is_empty() {
            return 0;
        }
        self.0.values().map(Vec::len).product()
    }

    /// Every axis combination, first axis varying slowest
    pub fn combinations(&self) -> Vec<BTreeMap<String, String>> {
        if self.0.is_empty() {
            return Vec::new();
        }

        let mut combos = vec![BTreeMap::new()];
        for (axis, values) in self.0.iter() {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for combo in &combos {
                for value in values {
                    let mut extended = combo.clone();
                    extended.insert(axis.to_string(), value.clone());
                    next.push(extended);
                }
            }
            combos = next;
        }
        combos
    }
}

/// A single step: either an action (`uses`) or a shell command (`run`)
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_condition: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,

    #[serde(skip_serializing_if = "OrderedMap::is_empty")]
    pub with: Params,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,

    #[serde(skip_serializing_if = "OrderedMap::is_empty")]
    pub env: Env,
}

impl Step {
    /// A step invoking a published action, e.g. `actions/cache@v4`
    pub fn action(name: impl Into<String>, uses: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uses: Some(uses.into()),
            ..Default::default()
        }
    }

    /// A step running a shell command
    pub fn command(name: impl Into<String>, run: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run: Some(run.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with.insert(key, value.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key, value.into());
        self
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.if_condition = Some(condition.into());
        self
    }

    /// Action reference without its version suffix
    pub fn action_name(&self) -> Option<&str> {
        self.uses
            .as_deref()
            .map(|uses| uses.split_once('@').map_or(uses, |(name, _)| name))
    }

    pub fn is_well_formed(&self) -> bool {
        self.uses.is_some() != self.run.is_some()
    }
}
