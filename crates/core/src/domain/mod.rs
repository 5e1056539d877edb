pub mod contract;
pub mod fortune;
