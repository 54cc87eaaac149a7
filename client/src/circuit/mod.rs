mod handle;
mod negotiator;

pub use handle::CircuitHandle;
pub use negotiator::{CircuitNegotiator, RetryOutcome};
