pub mod controller;
pub mod state;

pub use controller::{Collaborators, InterviewController, SessionSnapshot, SessionSummary};
pub use state::{InterviewPhase, ReadinessGates, SessionState, StartError};
