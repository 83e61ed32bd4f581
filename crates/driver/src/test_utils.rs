mod mock_engine;

pub(crate) use mock_engine::{MOCK_CONFIG, MockEngine, MockLoader, MockOptions, Probe};
