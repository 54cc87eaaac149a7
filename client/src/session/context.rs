use grid_shared::{NoticeKind, Timer};

use crate::{
    auth::{AuthClient, Credentials},
    bootstrap::BootstrapCoordinator,
    capability::CapabilityWaiter,
    circuit::CircuitNegotiator,
    SessionGrant,
};

/// Everything one login attempt builds up. Replaced wholesale on reset, so
/// no grant, circuit or tracker outlives the attempt that produced it, and
/// dropping the components drops their in-flight receivers with them.
#[derive(Default)]
pub(crate) struct Session {
    pub credentials: Option<Credentials>,
    pub auth: Option<AuthClient>,
    pub notice: Option<(NoticeKind, String)>,
    pub notice_reply: Option<bool>,
    pub grant: Option<SessionGrant>,
    pub circuit: Option<CircuitNegotiator>,
    pub capabilities: Option<CapabilityWaiter>,
    pub bootstrap: Option<BootstrapCoordinator>,
    pub precache: Option<Timer>,
    pub status_message: Option<String>,
}
