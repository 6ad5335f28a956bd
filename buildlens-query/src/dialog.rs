//! Draft filter editing and direct committed-state edits.
//!
//! While the filter dialog is open, edits land in a draft copy. Nothing
//! reaches the URL until [`FilterDialogBuffer::apply`]. Chip removal and
//! "reset" bypass the draft and navigate immediately.

use crate::codec::{QueryState, QueryStateCodec};
use crate::error::QueryError;
use crate::filter::{FilterSchema, FilterState, FilterValue};
use crate::location::Navigation;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FilterDialogBuffer {
    schema: Arc<FilterSchema>,
    draft: FilterState,
    open: bool,
}

impl FilterDialogBuffer {
    pub fn new(schema: Arc<FilterSchema>) -> Self {
        Self {
            schema,
            draft: FilterState::new(),
            open: false,
        }
    }

    /// Start an edit session seeded from the committed filters.
    pub fn open(&mut self, committed: &FilterState) {
        self.draft = committed.clone();
        self.open = true;
    }

    /// The committed filters changed while the session was open (history
    /// navigation, chip removal, a tab switch). The draft restarts from them.
    pub fn rebase(&mut self, committed: &FilterState) {
        if self.open {
            tracing::debug!("Committed filters moved; rebasing filter draft");
            self.draft = committed.clone();
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn draft(&self) -> &FilterState {
        &self.draft
    }

    /// Set one draft value. A sentinel value clears the key.
    pub fn set_draft_value(&mut self, key: &str, value: FilterValue) -> Result<(), QueryError> {
        if !self.open {
            return Err(QueryError::DialogClosed);
        }
        self.schema.assign(&mut self.draft, key, &value)
    }

    /// Structural comparison of the draft against the committed filters,
    /// which always come from the current URL.
    pub fn is_dirty(&self, committed: &FilterState) -> bool {
        self.open && &self.draft != committed
    }

    /// Reset every draft key to "not applied". The session stays open.
    pub fn clear_all(&mut self) -> Result<(), QueryError> {
        if !self.open {
            return Err(QueryError::DialogClosed);
        }
        self.draft.clear();
        Ok(())
    }

    /// Commit the draft (push navigation) and close the session.
    ///
    /// Sort and view state of `current` are carried over untouched.
    pub fn apply(
        &mut self,
        codec: &QueryStateCodec,
        current: &QueryState,
    ) -> Result<Navigation, QueryError> {
        if !self.open {
            return Err(QueryError::DialogClosed);
        }
        if !self.is_dirty(&current.filters) {
            return Err(QueryError::NotDirty);
        }
        let next = QueryState {
            filters: self.draft.clone(),
            ..current.clone()
        };
        self.close();
        Ok(Navigation::Push(codec.encode(&next)))
    }

    /// Discard the draft.
    pub fn cancel(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.open = false;
        self.draft = FilterState::new();
    }
}

/// "Reset filters" outside the dialog: clears every filter immediately.
pub fn reset_filters(codec: &QueryStateCodec, current: &QueryState) -> Navigation {
    let next = QueryState {
        filters: FilterState::new(),
        ..current.clone()
    };
    Navigation::Push(codec.encode(&next))
}

/// Removing one filter chip: a direct committed-state edit.
pub fn remove_filter(codec: &QueryStateCodec, current: &QueryState, key: &str) -> Navigation {
    let mut next = current.clone();
    next.filters.remove(key);
    Navigation::Push(codec.encode(&next))
}
