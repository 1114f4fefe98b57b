//! Column type tags

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Reserved name of the synthetic row-index column
pub const INDEX_COLUMN_NAME: &str = "_index";

/// Coercion target assigned to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Integer,
    Double,
    DateTime,
    String,
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Integer => write!(f, "integer"),
            TypeTag::Double => write!(f, "double"),
            TypeTag::DateTime => write!(f, "datetime"),
            TypeTag::String => write!(f, "string"),
        }
    }
}

impl std::str::FromStr for TypeTag {
    type Err = Error;

    /// Accepts the short names used by dataframe dtypes (`d`, `str`,
    /// `datetime64[ns]`) as well as the spelled-out ones.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "i" | "int" | "integer" | "int64" => Ok(TypeTag::Integer),
            "d" | "double" | "float" | "float64" | "number" => Ok(TypeTag::Double),
            "datetime" | "datetime64[ns]" | "timestamp" | "date" => Ok(TypeTag::DateTime),
            "str" | "string" | "text" | "utf8" => Ok(TypeTag::String),
            _ => Err(Error::InvalidOption {
                message: format!("unknown column type: {s}"),
            }),
        }
    }
}
