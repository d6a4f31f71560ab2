pub mod contract;
pub mod headline;
pub mod prediction;
pub mod sentiment;
