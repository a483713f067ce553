//! Local editing of one day's movement with optimistic deletes.
//!
//! An [`EditSession`] keeps two copies of the movement: the last state the
//! backend confirmed and the copy being edited. Adds and updates only touch
//! the edited copy and reach the backend on [`EditSession::save`]. Deletes
//! are applied locally at once and sent to the backend straight away; if the
//! backend refuses, the edited copy is reset to the confirmed one.
//!
//! Deletes are split in two halves so an event loop can keep rendering while
//! the request is in flight: [`EditSession::begin_delete`] applies the change
//! and hands out a [`DeleteTicket`], [`EditSession::finish_delete`] applies
//! the outcome. [`EditSession::delete`] runs both halves around the request.

use std::collections::HashSet;

use thiserror::Error;
use time::Date;

use crate::client::ApiError;
use crate::domain::{DailyMovement, Expense, Income, ItemId, ItemKind};
use crate::ports::MovementsApi;

#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Remote(#[from] ApiError),
}

/// A delete that has been applied locally and still needs the backend's
/// answer.
#[derive(Debug)]
#[must_use = "a started delete must be finished with EditSession::finish_delete"]
pub struct DeleteTicket {
    kind: ItemKind,
    id: ItemId,
    date: Date,
}

impl DeleteTicket {
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Date of the movement on the backend.
    pub fn date(&self) -> Date {
        self.date
    }

    /// Server id to delete, `None` for a line that was never saved.
    pub fn remote_id(&self) -> Option<i64> {
        self.id.remote()
    }
}

#[derive(Debug, Clone)]
pub struct EditSession {
    confirmed: DailyMovement,
    edited: DailyMovement,
    deleting: HashSet<(ItemKind, ItemId)>,
    saving: bool,
    next_local_id: u64,
}

impl EditSession {
    pub fn new(movement: DailyMovement) -> Self {
        Self {
            edited: movement.clone(),
            confirmed: movement,
            deleting: HashSet::new(),
            saving: false,
            next_local_id: 1,
        }
    }

    /// Starts over from a fresh copy of the movement. Deletes still in
    /// flight are forgotten; their completions will be ignored.
    pub fn reset(&mut self, movement: DailyMovement) {
        self.edited = movement.clone();
        self.confirmed = movement;
        self.deleting.clear();
        self.saving = false;
    }

    /// The movement as currently edited.
    pub fn movement(&self) -> &DailyMovement {
        &self.edited
    }

    /// The last state confirmed by the backend.
    pub fn confirmed(&self) -> &DailyMovement {
        &self.confirmed
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_deleting(&self, kind: ItemKind, id: ItemId) -> bool {
        self.deleting.contains(&(kind, id))
    }

    /// Whether the edited copy differs from the confirmed one.
    pub fn has_changes(&self) -> bool {
        self.edited != self.confirmed
    }

    fn next_id(&mut self) -> ItemId {
        let id = ItemId::Local(self.next_local_id);
        self.next_local_id += 1;
        id
    }

    /// Appends a new line with a temporary id and returns that id.
    pub fn add(&mut self, kind: ItemKind, label: &str, amount: f64) -> ItemId {
        let id = self.next_id();
        match kind {
            ItemKind::Income => self.edited.incomes.push(Income {
                id,
                label: label.to_string(),
                amount,
            }),
            ItemKind::Expense => self.edited.expenses.push(Expense {
                id,
                label: label.to_string(),
                amount,
                is_recurring: false,
            }),
        }
        id
    }

    /// Appends an expense that records a recurring payment.
    pub fn add_recurring_expense(&mut self, label: &str, amount: f64) -> ItemId {
        let id = self.next_id();
        self.edited.expenses.push(Expense {
            id,
            label: label.to_string(),
            amount,
            is_recurring: true,
        });
        id
    }

    /// Changes a line in place. Returns whether the line exists.
    pub fn update(&mut self, kind: ItemKind, id: ItemId, label: &str, amount: f64) -> bool {
        self.edited.update(kind, id, label, amount)
    }

    pub fn set_date(&mut self, date: Date) {
        self.edited.date = date;
    }

    /// Removes a line locally and reserves it for deletion on the backend.
    ///
    /// Returns `None`, and changes nothing, if a delete for this line is
    /// already in flight or the line is not in the edited movement. Incomes
    /// and expenses have separate id spaces.
    pub fn begin_delete(&mut self, kind: ItemKind, id: ItemId) -> Option<DeleteTicket> {
        if self.deleting.contains(&(kind, id)) || !self.edited.contains(kind, id) {
            return None;
        }

        self.deleting.insert((kind, id));
        self.edited.remove(kind, id);

        Some(DeleteTicket {
            kind,
            id,
            date: self.confirmed.date,
        })
    }

    /// Applies the backend's answer to a delete.
    ///
    /// On success the line is dropped from the confirmed movement as well.
    /// On failure the edited movement goes back to the confirmed one and the
    /// error is returned.
    pub fn finish_delete(
        &mut self,
        ticket: DeleteTicket,
        result: Result<(), ApiError>,
    ) -> Result<(), EditError> {
        if !self.deleting.remove(&(ticket.kind, ticket.id)) {
            tracing::debug!(id = %ticket.id, "ignoring completion of a forgotten delete");
            return Ok(());
        }

        match result {
            Ok(()) => {
                self.confirmed.remove(ticket.kind, ticket.id);
                self.edited.remove(ticket.kind, ticket.id);
                Ok(())
            }
            Err(e) => {
                tracing::error!(kind = %ticket.kind, id = %ticket.id, error = %e, "delete failed, rolling back");
                self.edited = self.confirmed.clone();
                Err(e.into())
            }
        }
    }

    /// Deletes a line optimistically and on the backend.
    ///
    /// Returns `Ok(false)` when nothing was done because the line is missing
    /// or already being deleted.
    pub async fn delete<A>(
        &mut self,
        api: &A,
        kind: ItemKind,
        id: ItemId,
    ) -> Result<bool, EditError>
    where
        A: MovementsApi + ?Sized,
    {
        let Some(ticket) = self.begin_delete(kind, id) else {
            return Ok(false);
        };

        let result = match ticket.remote_id() {
            Some(remote_id) => api.delete_item(ticket.date(), kind, remote_id).await,
            None => Ok(()),
        };

        self.finish_delete(ticket, result)?;
        Ok(true)
    }

    /// Marks the session as saving and returns the movement to send.
    pub fn begin_save(&mut self) -> DailyMovement {
        self.saving = true;
        self.edited.clone()
    }

    /// Applies the backend's answer to a save. A failed save leaves the
    /// edited movement untouched so it can be retried.
    pub fn finish_save(
        &mut self,
        result: Result<DailyMovement, ApiError>,
    ) -> Result<(), EditError> {
        self.saving = false;
        match result {
            Ok(saved) => {
                self.confirmed = saved.clone();
                self.edited = saved;
                Ok(())
            }
            Err(e) => {
                tracing::error!(date = %self.edited.date, error = %e, "saving movement failed");
                Err(e.into())
            }
        }
    }

    /// Sends the whole edited movement to the backend.
    pub async fn save<A>(&mut self, api: &A) -> Result<(), EditError>
    where
        A: MovementsApi + ?Sized,
    {
        let movement = self.begin_save();
        let result = api.save_movement(&movement).await;
        self.finish_save(result)
    }
}
