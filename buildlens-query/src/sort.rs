//! Single-column sort state and the `field` / `-field` token format.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Active sort. `column == None` means server-default ordering, in which case
/// the direction carries no meaning and is ignored by equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            direction: SortDirection::Desc,
        }
    }

    pub fn is_unsorted(&self) -> bool {
        self.column.is_none()
    }
}

impl PartialEq for SortState {
    fn eq(&self, other: &Self) -> bool {
        match (&self.column, &other.column) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b && self.direction == other.direction,
            _ => false,
        }
    }
}

impl Eq for SortState {}

/// `"-" + column` when descending, `column` when ascending, nothing when unsorted.
pub fn encode_token(sort: &SortState) -> Option<String> {
    let column = sort.column.as_deref()?;
    Some(match sort.direction {
        SortDirection::Asc => column.to_string(),
        SortDirection::Desc => format!("-{column}"),
    })
}

/// Total inverse of [`encode_token`]; an empty token is "unsorted".
pub fn decode_token(token: &str) -> SortState {
    let token = token.trim();
    match token.strip_prefix('-') {
        Some("") => SortState::unsorted(),
        Some(column) => SortState::desc(column),
        None if token.is_empty() => SortState::unsorted(),
        None => SortState::asc(token),
    }
}

/// Column-header click handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortController {
    sortable: Vec<String>,
}

impl SortController {
    pub fn new<I, S>(sortable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sortable: sortable.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_sortable(&self, column: &str) -> bool {
        self.sortable.iter().any(|c| c == column)
    }

    /// Same column flips direction; another column sorts ascending by it.
    /// Non-sortable columns leave `current` unchanged.
    pub fn toggle(&self, current: &SortState, clicked: &str) -> SortState {
        if !self.is_sortable(clicked) {
            return current.clone();
        }
        match current.column.as_deref() {
            Some(column) if column == clicked => SortState {
                column: Some(column.to_string()),
                direction: current.direction.flipped(),
            },
            _ => SortState::asc(clicked),
        }
    }
}
