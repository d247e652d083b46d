//! Progress reporting for opaque subprocesses and downloads

pub mod estimator;
pub mod profiles;
pub mod renderer;

pub use estimator::{ProgressEstimator, Stream};
pub use profiles::ProgressProfile;
pub use renderer::{ProgressRenderer, ProgressState};
