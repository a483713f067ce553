//! The backend as seen by the rest of the crate.
//!
//! [`MovementsClient`](crate::MovementsClient) talks to the real HTTP API;
//! front-ends and tests can provide their own implementation.

use async_trait::async_trait;
use time::{Date, Month};

use crate::client::ApiError;
use crate::domain::{
    DailyMovement, ItemKind, MonthSummaryRow, NewTag, SearchScope, Tag, TagSearchHit,
};

#[async_trait]
pub trait MovementsApi: Send + Sync {
    /// Most recent movements, newest first.
    async fn list_movements(&self, limit: u32) -> Result<Vec<DailyMovement>, ApiError>;

    /// The movement recorded on `date`, if any.
    async fn movement_on(&self, date: Date) -> Result<Option<DailyMovement>, ApiError>;

    /// Creates or replaces the movement for its date and returns what the
    /// backend stored, with server ids for any new lines.
    async fn save_movement(&self, movement: &DailyMovement) -> Result<DailyMovement, ApiError>;

    async fn delete_movement(&self, date: Date) -> Result<(), ApiError>;

    /// Deletes one income or expense line. A line that no longer exists
    /// counts as deleted.
    async fn delete_item(&self, date: Date, kind: ItemKind, id: i64) -> Result<(), ApiError>;

    async fn month_summary(&self, year: i32, month: Month)
        -> Result<Vec<MonthSummaryRow>, ApiError>;

    async fn search_by_label(
        &self,
        label: &str,
        scope: SearchScope,
        limit: u32,
    ) -> Result<Vec<TagSearchHit>, ApiError>;

    async fn tags(&self) -> Result<Vec<Tag>, ApiError>;

    async fn create_tag(&self, tag: &NewTag) -> Result<Tag, ApiError>;

    async fn update_tag(&self, id: i64, tag: &NewTag) -> Result<Tag, ApiError>;

    async fn delete_tag(&self, id: i64) -> Result<(), ApiError>;
}
