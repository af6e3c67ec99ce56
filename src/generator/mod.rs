pub mod nodes;
pub mod outlet;
pub mod prompts;
pub mod router;
pub mod state;
pub mod workflow;
