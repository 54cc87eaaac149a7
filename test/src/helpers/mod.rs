
pub use assertions::{assert_path, states_visited};
pub use packet_exchange::{run_until, tick_and_exchange, Clock};
