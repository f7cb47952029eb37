// The leveling module: the XP ledger, the tier table and the service that
// ties them to the platform ports.

pub mod ledger;
pub mod notices;
pub mod revoke_args;
pub mod role_policy;
pub mod xp_service;

pub use ledger::{apply_delta, LedgerEntry, LedgerError, LedgerStore};
pub use role_policy::{default_tiers, RolePolicy};
pub use xp_service::XpService;
