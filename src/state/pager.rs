//! Pager snapshot and its reducer.

use crate::mvi::{Intent, Reducer, Snapshot};
use crate::reporting::PagerContext;

/// Position of a pager.
///
/// `has_next` and `has_previous` are always derived from `position` and
/// `page_count`; construct through [`PagerState::new`] and the reducer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagerState {
    pub identifier: String,
    pub position: usize,
    pub page_count: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Snapshot for PagerState {}

impl PagerState {
    pub fn new(identifier: impl Into<String>, page_count: usize) -> Self {
        Self {
            identifier: identifier.into(),
            page_count,
            ..Self::default()
        }
        .at(0)
    }

    pub fn reporting_context(&self) -> PagerContext {
        PagerContext {
            identifier: self.identifier.clone(),
            page_index: self.position,
            page_count: self.page_count,
        }
    }

    fn at(mut self, position: usize) -> Self {
        let last = self.page_count.saturating_sub(1);
        self.position = position.min(last);
        self.has_next = self.position < last;
        self.has_previous = self.position > 0;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerIntent {
    Scroll(usize),
    Next,
    Previous,
    SetPageCount(usize),
}

impl Intent for PagerIntent {}

pub struct PagerReducer;

impl Reducer for PagerReducer {
    type State = PagerState;
    type Intent = PagerIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            PagerIntent::Scroll(position) => state.at(position),
            PagerIntent::Next => {
                let position = state.position + 1;
                state.at(position)
            }
            PagerIntent::Previous => {
                let position = state.position.saturating_sub(1);
                state.at(position)
            }
            PagerIntent::SetPageCount(page_count) => {
                let position = state.position;
                PagerState { page_count, ..state }.at(position)
            }
        }
    }
}
