//! Error types for query-state editing.

use crate::filter::FilterKind;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unknown filter: {key}")]
    UnknownFilter { key: String },

    #[error("Filter {key} expects a {expected:?} value, got {got:?}")]
    KindMismatch {
        key: String,
        expected: FilterKind,
        got: FilterKind,
    },

    #[error("Filter dialog is not open")]
    DialogClosed,

    #[error("No filter changes to apply")]
    NotDirty,
}
