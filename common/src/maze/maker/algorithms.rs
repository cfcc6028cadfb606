pub mod backtrack;
pub mod random;
pub mod wilson;
