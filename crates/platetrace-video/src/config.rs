use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::backends::{MockProvider, RawFileProvider};
use crate::core::DynFrameProvider;
use platetrace_types::{FrameError, FrameResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Mock,
    Raw,
}

impl FromStr for Backend {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(Backend::Mock),
            "raw" => Ok(Backend::Raw),
            other => Err(FrameError::configuration(format!(
                "unknown backend '{other}'"
            ))),
        }
    }
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Mock => "mock",
            Backend::Raw => "raw",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frame source settings resolved from defaults, the environment, and the
/// caller. `frame_size` is required by the raw backend, which cannot infer
/// dimensions from a headerless plane file.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub backend: Backend,
    pub input: Option<PathBuf>,
    pub frame_size: Option<(u32, u32)>,
    pub channel_capacity: Option<NonZeroUsize>,
    pub frame_limit: Option<u64>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            backend: Backend::Mock,
            input: None,
            frame_size: None,
            channel_capacity: None,
            frame_limit: None,
        }
    }
}

impl Configuration {
    pub fn from_env() -> FrameResult<Self> {
        let mut config = Configuration::default();
        if let Ok(backend) = env::var("PLATETRACE_BACKEND") {
            config.backend = Backend::from_str(&backend)?;
        }
        if let Ok(path) = env::var("PLATETRACE_INPUT") {
            config.input = Some(PathBuf::from(path));
        }
        if let Ok(capacity) = env::var("PLATETRACE_CHANNEL_CAPACITY") {
            let parsed: usize = capacity.parse().map_err(|_| {
                FrameError::configuration(format!(
                    "failed to parse PLATETRACE_CHANNEL_CAPACITY='{capacity}' as a positive integer"
                ))
            })?;
            let Some(value) = NonZeroUsize::new(parsed) else {
                return Err(FrameError::configuration(
                    "PLATETRACE_CHANNEL_CAPACITY must be greater than zero",
                ));
            };
            config.channel_capacity = Some(value);
        }
        Ok(config)
    }

    pub fn available_backends() -> Vec<Backend> {
        vec![Backend::Mock, Backend::Raw]
    }

    pub fn create_provider(&self) -> FrameResult<DynFrameProvider> {
        match self.backend {
            Backend::Mock => Ok(Box::new(MockProvider::new(self)?)),
            Backend::Raw => Ok(Box::new(RawFileProvider::new(self)?)),
        }
    }
}
