mod mock;
mod raw;

pub use mock::MockProvider;
pub use raw::RawFileProvider;
