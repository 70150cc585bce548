pub mod leave;

pub use leave::{CreatedLeave, Decision, DecisionParams, LeaveService, NewLeave};
