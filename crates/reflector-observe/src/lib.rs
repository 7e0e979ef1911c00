mod logger;
pub use logger::*;

mod subscriber;

#[cfg(feature = "subscriber")]
pub use subscriber::*;
