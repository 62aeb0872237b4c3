pub mod checkpoint;
pub mod place;
pub mod queue_entry;

pub use checkpoint::ListingCheckpoint;
pub use place::{DatasetItem, FailedRecord, HourOccupancy, PlaceRecord, PopularTimesHistogram, Review, Weekday};
pub use queue_entry::{EntryLabel, Priority, QueueEntry, UserData};
