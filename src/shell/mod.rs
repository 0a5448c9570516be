//! Client-side orchestration: what the viewer sees and the calls behind it.

pub mod app;
pub mod client;
pub mod state;

pub use app::AppShell;
pub use client::{HttpLlaneraApi, LlaneraApi};
pub use state::{LiveChannel, Overlay, ScheduleEntry, SearchResults, ShellState, Tab};
