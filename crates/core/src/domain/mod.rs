pub mod contract;
pub mod promotion;
