mod fixed;
mod replay;

pub use fixed::FixedOcrEngine;
pub use replay::ReplayOcrEngine;
