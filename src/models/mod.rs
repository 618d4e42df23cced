pub mod aggregation;
pub mod git;
pub mod hook;
pub mod message;
pub mod session;

pub use aggregation::{CostsAggregation, SessionSummary, UserInputsAggregation};
pub use git::CommitOutcome;
pub use hook::{HookInformation, HookInput};
pub use message::{MessageUsage, UsageTotals};
pub use session::{
    CacheUsage, CostData, CostPayload, InputKind, SessionRecord, StoredSession, TokenTotals,
    UserInput, UserInputsPayload,
};
