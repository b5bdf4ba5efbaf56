// Models module

pub mod joke;
pub mod math;
pub mod response;
pub mod user;

// Re-export commonly used types
pub use joke::{CreateJokeRequest, Joke, JokeListQuery, NewJoke, PairedJoke, UserSummary};
pub use math::{IncrementQuery, LcmQuery};
pub use response::{ApiResponse, HealthReport, HealthStatus, ServiceStatus, ServiceStatuses};
pub use user::{Topic, User};
