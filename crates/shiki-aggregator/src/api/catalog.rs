//! Fixed GraphQL query templates for the Shikimori API.
//!
//! Each operation is a declarative record: the query body, the variables it
//! accepts and the shape of the result. Upstream schema changes only touch
//! this table.

use crate::error::{AggregatorError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Logical operations served by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    TopRanked,
    DetailById,
    BatchByIds,
    NewReleases,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Search,
        Operation::TopRanked,
        Operation::DetailById,
        Operation::BatchByIds,
        Operation::NewReleases,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::TopRanked => "top_ranked",
            Operation::DetailById => "detail_by_id",
            Operation::BatchByIds => "batch_by_ids",
            Operation::NewReleases => "new_releases",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = AggregatorError;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| AggregatorError::UnknownOperation(s.to_string()))
    }
}

/// Declared type of a template variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    String,
    Int,
    StringList,
}

impl VarType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            VarType::String => value.is_string(),
            VarType::Int => value.as_i64().is_some(),
            VarType::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

/// A variable accepted by a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableSpec {
    pub name: &'static str,
    pub ty: VarType,
    pub required: bool,
}

const fn required(name: &'static str, ty: VarType) -> VariableSpec {
    VariableSpec { name, ty, required: true }
}

const fn optional(name: &'static str, ty: VarType) -> VariableSpec {
    VariableSpec { name, ty, required: false }
}

/// Whether the caller expects one element or the whole collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Single,
    Collection,
}

/// Variable bindings sent alongside a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables(Map<String, Value>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable, replacing any previous value
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Immutable query definition
#[derive(Debug, PartialEq, Eq)]
pub struct QueryTemplate {
    pub operation: Operation,
    pub query: &'static str,
    pub variables: &'static [VariableSpec],
    pub shape: ResponseShape,
}

impl QueryTemplate {
    /// Names of all `$variable` placeholders used in the query body
    pub fn placeholders(&self) -> BTreeSet<&'static str> {
        let query = self.query;
        let bytes = query.as_bytes();
        let mut names = BTreeSet::new();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] == b'$' {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                if end > start {
                    names.insert(&query[start..end]);
                }
                i = end;
            } else {
                i += 1;
            }
        }

        names
    }

    /// Names of the declared variables
    pub fn declared(&self) -> BTreeSet<&'static str> {
        self.variables.iter().map(|v| v.name).collect()
    }

    /// Check bindings against the declared schema
    ///
    /// Rejects undeclared names, type mismatches and missing required
    /// variables.
    pub fn bind(&self, variables: Variables) -> Result<Variables> {
        for name in variables.as_map().keys() {
            if !self.variables.iter().any(|v| v.name == name) {
                return Err(AggregatorError::InvalidInput(format!(
                    "{}: undeclared variable ${}",
                    self.operation, name
                )));
            }
        }

        for spec in self.variables {
            match variables.get(spec.name) {
                Some(value) if !spec.ty.accepts(value) => {
                    return Err(AggregatorError::InvalidInput(format!(
                        "{}: variable ${} expects {:?}, got {}",
                        self.operation, spec.name, spec.ty, value
                    )));
                }
                None if spec.required => {
                    return Err(AggregatorError::InvalidInput(format!(
                        "{}: missing required variable ${}",
                        self.operation, spec.name
                    )));
                }
                _ => {}
            }
        }

        Ok(variables)
    }
}

const SEARCH_QUERY: &str = r#"
query($search: String!, $limit: Int!) {
  animes(search: $search, limit: $limit) {
    id
    malId
    name
    russian
    rating
    score
    description
    poster { id originalUrl mainUrl }
    genres { id name russian kind }
  }
}
"#;

const TOP_RANKED_QUERY: &str = r#"
query($limit: PositiveInt = 30, $page: PositiveInt, $genre: String) {
  animes(limit: $limit, page: $page, order: ranked, genre: $genre) {
    id
    malId
    name
    russian
    score
    description
    poster { id originalUrl mainUrl }
    genres { id name russian kind }
  }
}
"#;

const DETAIL_BY_ID_QUERY: &str = r#"
query($id: String!) {
  animes(ids: $id) {
    id
    name
    russian
    episodes
    score
    description
    poster { id originalUrl mainUrl }
    genres { id name russian kind }
  }
}
"#;

const BATCH_BY_IDS_QUERY: &str = r#"
query($ids: [String!]!) {
  animes(ids: $ids) {
    id
    name
    russian
    description
    score
    status
    poster { id originalUrl mainUrl }
    genres { id name russian kind }
  }
}
"#;

const NEW_RELEASES_QUERY: &str = r#"
query($limit: Int!, $season: SeasonString!, $status: AnimeStatusString!) {
  animes(limit: $limit, order: popularity, season: $season, status: $status) {
    id
    name
    russian
    score
    poster { originalUrl mainUrl }
    airedOn { year month day date }
    genres { id name russian kind }
  }
}
"#;

static TEMPLATES: [QueryTemplate; 5] = [
    QueryTemplate {
        operation: Operation::Search,
        query: SEARCH_QUERY,
        variables: &[
            required("search", VarType::String),
            required("limit", VarType::Int),
        ],
        shape: ResponseShape::Collection,
    },
    QueryTemplate {
        operation: Operation::TopRanked,
        query: TOP_RANKED_QUERY,
        variables: &[
            required("limit", VarType::Int),
            required("page", VarType::Int),
            optional("genre", VarType::String),
        ],
        shape: ResponseShape::Collection,
    },
    QueryTemplate {
        operation: Operation::DetailById,
        query: DETAIL_BY_ID_QUERY,
        variables: &[required("id", VarType::String)],
        shape: ResponseShape::Single,
    },
    QueryTemplate {
        operation: Operation::BatchByIds,
        query: BATCH_BY_IDS_QUERY,
        variables: &[required("ids", VarType::StringList)],
        shape: ResponseShape::Collection,
    },
    QueryTemplate {
        operation: Operation::NewReleases,
        query: NEW_RELEASES_QUERY,
        variables: &[
            required("limit", VarType::Int),
            required("season", VarType::String),
            required("status", VarType::String),
        ],
        shape: ResponseShape::Collection,
    },
];

/// Registry of the query templates, fixed at compile time
#[derive(Debug, Clone, Copy)]
pub struct QueryCatalog {
    templates: &'static [QueryTemplate],
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self { templates: &TEMPLATES }
    }
}

impl QueryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the template registered for an operation
    pub fn lookup(&self, operation: Operation) -> Result<&'static QueryTemplate> {
        self.templates
            .iter()
            .find(|t| t.operation == operation)
            .ok_or_else(|| AggregatorError::UnknownOperation(operation.to_string()))
    }

    /// Find a template by operation name
    pub fn lookup_name(&self, name: &str) -> Result<&'static QueryTemplate> {
        self.lookup(name.parse()?)
    }

    pub fn templates(&self) -> &'static [QueryTemplate] {
        self.templates
    }
}
