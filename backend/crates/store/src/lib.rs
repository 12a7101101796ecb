pub mod checkpoint;
pub mod ledger;

mod file;

pub use checkpoint::json_repository::JsonCheckpointRepository;
pub use ledger::json_repository::JsonLedgerRepository;
