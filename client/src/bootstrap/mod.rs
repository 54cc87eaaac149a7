mod batch;
mod coordinator;

pub use batch::{BatchResult, FetchBatch};
pub use coordinator::BootstrapCoordinator;

/// The background fetches a session waits on before it is ready
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Skeleton,
    Appearance,
    Contacts,
}

impl FetchKind {
    pub const ALL: [FetchKind; 3] = [
        FetchKind::Skeleton,
        FetchKind::Appearance,
        FetchKind::Contacts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FetchKind::Skeleton => "skeleton",
            FetchKind::Appearance => "appearance",
            FetchKind::Contacts => "contact",
        }
    }
}
