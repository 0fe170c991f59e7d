pub mod alert;
pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod router;
pub mod session;

pub use alert::{AlertGate, AlertKind, AlertSink, ConsoleAlert};
pub use client::{ApiClient, CallBody, CallOptions};
pub use config::ClientConfig;
pub use error::{ClientError, KnownApiError};
pub use router::{GuardDecision, NavigationGuard, Navigator, RouteAccess};
pub use session::claims::{decode_claims, Claims};
pub use session::{FileTokenStorage, MemoryTokenStorage, TokenStorage, TokenStore};
