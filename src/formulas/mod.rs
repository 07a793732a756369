mod cnf;
mod lit;

pub use cnf::*;
pub use lit::*;
