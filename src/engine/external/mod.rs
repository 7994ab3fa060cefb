pub mod ledger;
pub mod plotter;
