mod replay_engine;
#[cfg(test)]
mod tests;

pub use replay_engine::{ReplayEngine, ReplaySummary};
