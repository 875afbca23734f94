pub mod dims;
pub mod executors;
pub mod observers;
pub mod propagators;

pub use dims::*;
