use crate::core::error::Error;
use crate::cscope::query_type::QueryType;
use std::fmt;
use std::str::FromStr;

/// Prefix accepted in front of any command id
pub const COMMAND_PREFIX: &str = "cscope-nav:";

/// The fixed set of user commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Build,
    /// Look up the word under the cursor, or a prompted word when `input`
    Query { query_type: QueryType, input: bool },
    ShowResults,
    Pop,
}

impl Command {
    /// Every command id, in menu order
    pub fn ids() -> Vec<String> {
        let mut ids = vec![Command::Build.to_string()];
        for query_type in QueryType::ALL {
            ids.push(Command::Query { query_type, input: false }.to_string());
            ids.push(Command::Query { query_type, input: true }.to_string());
        }
        ids.push(Command::ShowResults.to_string());
        ids.push(Command::Pop.to_string());
        ids
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Build => f.write_str("build"),
            Command::Query { query_type, input: false } => write!(f, "{}", query_type),
            Command::Query { query_type, input: true } => write!(f, "{}-input", query_type),
            Command::ShowResults => f.write_str("show-results"),
            Command::Pop => f.write_str("pop"),
        }
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        let id = id.strip_prefix(COMMAND_PREFIX).unwrap_or(id);
        match id {
            "build" => return Ok(Command::Build),
            "show-results" => return Ok(Command::ShowResults),
            "pop" => return Ok(Command::Pop),
            _ => {}
        }

        let (name, input) = match id.strip_suffix("-input") {
            Some(name) => (name, true),
            None => (id, false),
        };
        name.parse::<QueryType>()
            .map(|query_type| Command::Query { query_type, input })
            .map_err(|_| Error::UnknownCommand(s.to_string()))
    }
}
