mod mock;
mod replay;

pub use mock::MockSceneDetector;
pub use replay::ReplayDetector;
