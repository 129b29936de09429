pub mod electrolyzer;
pub mod grid;
pub mod storage;
pub mod turbine;
