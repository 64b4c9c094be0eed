//! Numerical kernels for the wakefield field solver: 5-point stencil
//! smoothing, geometric multigrid, spectral Poisson solves, interpolation
//! and order-stable reductions.

pub mod fft;
pub mod interp;
pub mod multigrid;
pub mod reduce;
pub mod sor;
pub mod spectral;
