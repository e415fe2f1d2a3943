// Authentication module
// Manages the token lifecycle: acquisition, publication and scheduled renewal

mod cell;
mod endpoint;
mod manager;
mod schedule;
mod types;

pub use cell::{TokenCell, TokenReader};
pub use endpoint::{AuthEndpoint, HttpAuthEndpoint};
pub use manager::CredentialManager;
pub use schedule::{
    grace_period, renewal_delay_secs, RenewalHandle, RenewalScheduler, RenewalTask,
};
pub use types::Token;
