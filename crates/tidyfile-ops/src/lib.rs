//! Organization planning and execution for tidyfile.
//!
//! A [`Planner`] turns a scan index into an [`OrganizationPlan`]: one
//! move, copy or skip action per file, with every destination unique.
//! A [`PlanExecutor`] applies the plan to the filesystem, either blocking
//! or in the background with progress reported over a channel.
//!
//! ```rust,ignore
//! use tidyfile_ops::{ByType, DuplicatePolicy, PlanExecutor, Planner};
//!
//! let plan = Planner::new()
//!     .plan(&index, "/out".as_ref(), &ByType, DuplicatePolicy::KeepAll, None)?;
//! let report = PlanExecutor::new().execute(&plan)?;
//! println!("{}", report.summary());
//! ```

mod conflict;
mod error;
mod executor;
mod plan;
mod planner;
mod progress;
mod rules;

pub use conflict::suffixed_path;
pub use error::OrganizeError;
pub use executor::{
    start_execute, ActionOutcome, ActionStatus, ExecuteEvent, ExecutionReport, PlanExecutor,
};
pub use plan::{ActionKind, OrganizationPlan, PlannedAction};
pub use planner::{
    plan, DuplicatePolicy, PlanOptions, PlanOptionsBuilder, Planner, TransferMode,
    ALREADY_IN_PLACE,
};
pub use progress::OperationProgress;
pub use rules::{ByExtension, ByModifiedMonth, ByType, CategoryMap, LayoutRule, RuleKind};

/// Default channel buffer size for execution progress updates.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
