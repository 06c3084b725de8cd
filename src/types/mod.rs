//! Structured drafts produced by the content generators
//!
//! Each type is parsed from the model's JSON answer and validated before an
//! orchestrator sees it:
//! - Commit messages
//! - Pull request descriptions
//! - Jira tickets

mod commit;
mod pr;
mod ticket;

pub use self::commit::CommitGeneration;
pub use pr::PrDescriptionGeneration;
pub use ticket::TicketGeneration;
