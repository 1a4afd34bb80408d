// Path planning algorithms module

pub mod a_star;
pub mod coverage_sweep;
pub mod d_star_lite;

pub use a_star::*;
pub use coverage_sweep::*;
pub use d_star_lite::*;
