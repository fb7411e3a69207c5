//! Itinerary mutations. Timeline entries live only in the local snapshot.

use super::{
    model::{EventPatch, NewEvent, TimelineEvent},
    state::{TripState, log_rejection},
};
use crate::errors::{Error, Result};
use tracing::debug;
use uuid::Uuid;

impl TripState {
    /// Adds an itinerary entry.
    pub fn add_event(&mut self, input: NewEvent) -> Result<Uuid> {
        input.validate().inspect_err(log_rejection("add_event"))?;

        let event = TimelineEvent {
            id: Uuid::new_v4(),
            trip_id: self.trip_id,
            title: input.title.trim().to_string(),
            description: input.description,
            date: input.date,
            time: input.time,
            location: input.location,
            kind: input.kind,
        };
        let id = event.id;
        debug!(event = %event.title, date = %event.date, "Added timeline event");
        self.timeline.push(event);
        Ok(id)
    }

    /// Applies a partial update to an itinerary entry.
    pub fn update_event(&mut self, id: Uuid, patch: &EventPatch) -> Result<()> {
        patch.validate().inspect_err(log_rejection("update_event"))?;
        let event = self
            .timeline
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(Error::EventNotFound { id })
            .inspect_err(log_rejection("update_event"))?;
        event.apply(patch);
        Ok(())
    }

    /// Removes an itinerary entry.
    pub fn delete_event(&mut self, id: Uuid) -> Result<()> {
        let before = self.timeline.len();
        self.timeline.retain(|e| e.id != id);
        if self.timeline.len() == before {
            return Err(Error::EventNotFound { id }).inspect_err(log_rejection("delete_event"));
        }
        Ok(())
    }
}
