mod context;
mod grant;
mod state;
mod state_machine;

pub use grant::SessionGrant;
pub use state::SessionState;
pub use state_machine::SessionStateMachine;
