pub mod constructor;
pub mod driver;
pub mod race;
pub mod snapshot;
pub mod subscriber;

pub use constructor::Constructor;
pub use driver::Driver;
pub use race::{DriverResult, Race, RaceResult};
pub use snapshot::Snapshot;
pub use subscriber::Subscriber;
