use crate::core::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The lookups cscope answers in line-oriented mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Symbol,
    Definition,
    Callee,
    Caller,
    Text,
    Egrep,
    File,
    Include,
    Set,
}

impl QueryType {
    pub const ALL: [QueryType; 9] = [
        QueryType::Symbol,
        QueryType::Definition,
        QueryType::Callee,
        QueryType::Caller,
        QueryType::Text,
        QueryType::Egrep,
        QueryType::File,
        QueryType::Include,
        QueryType::Set,
    ];

    /// Field flag selecting this lookup (`-0` .. `-8`)
    pub fn flag(self) -> &'static str {
        match self {
            QueryType::Symbol => "-0",
            QueryType::Definition => "-1",
            QueryType::Callee => "-2",
            QueryType::Caller => "-3",
            QueryType::Text => "-4",
            QueryType::Egrep => "-5",
            QueryType::File => "-6",
            QueryType::Include => "-7",
            QueryType::Set => "-8",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QueryType::Symbol => "symbol",
            QueryType::Definition => "definition",
            QueryType::Callee => "callee",
            QueryType::Caller => "caller",
            QueryType::Text => "text",
            QueryType::Egrep => "egrep",
            QueryType::File => "file",
            QueryType::Include => "include",
            QueryType::Set => "set",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QueryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryType::ALL
            .iter()
            .copied()
            .find(|query_type| query_type.name() == s)
            .ok_or_else(|| Error::UnknownQueryType(s.to_string()))
    }
}
