pub mod engine;
pub mod evaluator;
pub mod ledger;
