pub mod controller;
pub mod handlers;
pub mod prompt;
pub mod router;
pub mod state;
pub mod status;
pub mod upload;

pub use controller::{FormUpdate, StudioController, StudioSettings};
pub use router::studio_router;
pub use state::StudioSnapshot;
