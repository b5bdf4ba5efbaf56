// Services module
// Business logic between the HTTP handlers and the outbound collaborators

pub mod combiner;
pub mod jokes;
pub mod math;
pub mod random;

pub use jokes::{JokesService, PAIR_BATCH_SIZE};
