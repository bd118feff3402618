pub mod forms;
pub mod invalidation;
pub mod ledger;
