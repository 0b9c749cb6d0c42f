use std::fmt::Debug;

use tracing::{debug, warn};

use crate::api::FetchError;

/// Handle for one issued refresh. Only the most recently issued ticket of a
/// slot may change the slot's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket<P> {
    id: u64,
    params: P,
}

impl<P: Copy> RefreshTicket<P> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn params(&self) -> P {
        self.params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { count: usize },
    /// A newer ticket was issued before this response arrived.
    Discarded { latest: u64 },
}

/// A collection replaced wholesale by the latest completed refresh.
#[derive(Debug, Clone)]
pub struct FeedSlot<P, T> {
    items: Vec<T>,
    loaded_for: Option<P>,
    last_error: Option<FetchError>,
    next_id: u64,
    latest_issued: Option<u64>,
    latest_completed: Option<u64>,
}

impl<P, T> Default for FeedSlot<P, T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loaded_for: None,
            last_error: None,
            next_id: 1,
            latest_issued: None,
            latest_completed: None,
        }
    }
}

impl<P, T> FeedSlot<P, T>
where
    P: Copy + PartialEq + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, params: P) -> RefreshTicket<P> {
        let id = self.next_id;
        self.next_id += 1;
        self.latest_issued = Some(id);
        debug!(request_id = id, ?params, "refresh issued");
        RefreshTicket { id, params }
    }

    pub fn complete(
        &mut self,
        ticket: RefreshTicket<P>,
        result: Result<Vec<T>, FetchError>,
    ) -> Result<RefreshOutcome, FetchError> {
        let latest = self.latest_issued.unwrap_or(0);
        if Some(ticket.id) != self.latest_issued {
            debug!(
                request_id = ticket.id,
                latest,
                params = ?ticket.params,
                "discarding out-of-date refresh response"
            );
            return Ok(RefreshOutcome::Discarded { latest });
        }

        self.latest_completed = Some(ticket.id);
        match result {
            Ok(items) => {
                let count = items.len();
                self.items = items;
                self.loaded_for = Some(ticket.params);
                self.last_error = None;
                debug!(request_id = ticket.id, count, "refresh applied");
                Ok(RefreshOutcome::Applied { count })
            }
            Err(err) => {
                warn!(
                    request_id = ticket.id,
                    params = ?ticket.params,
                    error = %err,
                    "refresh failed; keeping previous contents"
                );
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Parameters of the refresh that produced the current contents.
    pub fn loaded_for(&self) -> Option<P> {
        self.loaded_for
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.latest_issued.is_some() && self.latest_issued != self.latest_completed
    }
}
