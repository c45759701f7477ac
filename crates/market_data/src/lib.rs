pub mod ledger;
pub mod remote;
pub mod services;
pub mod traits;
