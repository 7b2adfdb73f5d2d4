pub mod calculator;
pub mod fetcher;
pub mod types;

pub use calculator::Calculator;
pub use fetcher::{
    ActionCollection, CollectionCancelled, Fetcher, GoalsCollection, Signal, SkippedSignal,
};
pub use types::{ActionItems, GoalStatus, GoalsProgress, RawGoalsData};
