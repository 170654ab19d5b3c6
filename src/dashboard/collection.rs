//! Local list backing one dashboard screen

use std::future::Future;

use super::error::{PageError, PageResult};
use crate::models::Record;
use crate::store::StoreResult;

/// Where a newly created record goes in the local list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Front,
    Back,
}

/// Records shown on a screen, plus loading flag and last error
///
/// Successful mutations patch the local list in place; failed ones record
/// the error and leave the list as it was.
#[derive(Debug, Clone)]
pub struct Collection<T: Record> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
}

impl<T: Record> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed operation, cleared by a successful load
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Replace the list with the result of `fetch`
    pub async fn load<F>(&mut self, fetch: F) -> PageResult<()>
    where
        F: Future<Output = StoreResult<Vec<T>>>,
    {
        self.loading = true;
        let result = fetch.await;
        self.loading = false;

        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    pub fn created(&mut self, result: StoreResult<T>, placement: Placement) -> PageResult<T> {
        let item = result.map_err(|e| self.fail(e.into()))?;
        match placement {
            Placement::Front => self.items.insert(0, item.clone()),
            Placement::Back => self.items.push(item.clone()),
        }
        Ok(item)
    }

    pub fn updated(&mut self, result: StoreResult<T>) -> PageResult<T> {
        let item = result.map_err(|e| self.fail(e.into()))?;
        if let Some(slot) = self.items.iter_mut().find(|slot| slot.id() == item.id()) {
            *slot = item.clone();
        }
        Ok(item)
    }

    pub fn deleted(&mut self, id: &str, result: StoreResult<()>) -> PageResult<()> {
        result.map_err(|e| self.fail(e.into()))?;
        self.items.retain(|item| item.id() != id);
        Ok(())
    }

    /// Record an error raised outside the store (e.g. validation)
    pub fn fail(&mut self, error: PageError) -> PageError {
        tracing::debug!(error = %error, "Dashboard operation failed");
        self.error = Some(error.to_string());
        error
    }
}
