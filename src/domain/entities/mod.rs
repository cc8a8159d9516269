pub mod decision;
pub mod learning;
pub mod trade;
pub mod trade_result;
