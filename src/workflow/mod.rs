pub mod detail_enqueuer;
pub mod detail_extractor;
pub mod listing_ctx;
pub mod listing_walker;

pub use detail_enqueuer::{place_identity, DetailEnqueuer, PageOutcome};
pub use detail_extractor::DetailExtractor;
pub use listing_ctx::ListingCtx;
pub use listing_walker::{ListingWalker, WalkOutcome};
