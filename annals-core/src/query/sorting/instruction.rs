use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AnnalsError, Result};

/// Sort order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// A client-supplied sort instruction such as `"Index"` or `"-PublishedAt"`.
///
/// The instruction is trimmed once; a leading `-` selects descending order
/// and the remainder is taken verbatim as the column name. Column names are
/// matched exactly (case-sensitive) by a [`SortRegistry`](super::SortRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortInstruction {
    column: String,
    order: SortOrder,
}

impl SortInstruction {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (order, column) = match trimmed.strip_prefix('-') {
            Some(rest) => (SortOrder::Descending, rest),
            None => (SortOrder::Ascending, trimmed),
        };

        if column.is_empty() {
            return Err(AnnalsError::InvalidSortKey {
                column: column.to_string(),
            });
        }

        Ok(Self {
            column: column.to_string(),
            order,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }
}

impl FromStr for SortInstruction {
    type Err = AnnalsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SortInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.order {
            SortOrder::Ascending => write!(f, "{}", self.column),
            SortOrder::Descending => write!(f, "-{}", self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_dash_means_descending() {
        let instruction = SortInstruction::parse("-Index").unwrap();
        assert_eq!(instruction.column(), "Index");
        assert_eq!(instruction.order(), SortOrder::Descending);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let instruction = SortInstruction::parse("  Title \t").unwrap();
        assert_eq!(instruction.column(), "Title");
        assert_eq!(instruction.order(), SortOrder::Ascending);
    }

    #[test]
    fn column_after_dash_is_taken_verbatim() {
        let instruction = SortInstruction::parse("- Index").unwrap();
        assert_eq!(instruction.column(), " Index");
    }

    #[test]
    fn empty_column_is_rejected() {
        for raw in ["", "   ", "-", " - "] {
            let err = SortInstruction::parse(raw).unwrap_err();
            assert!(matches!(err, AnnalsError::InvalidSortKey { .. }), "{raw:?}");
        }
    }

    #[test]
    fn display_round_trips_direction() {
        assert_eq!(SortInstruction::parse("-Title").unwrap().to_string(), "-Title");
        assert_eq!(SortInstruction::parse("Title").unwrap().to_string(), "Title");
    }
}
