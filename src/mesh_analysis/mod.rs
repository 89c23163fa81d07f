pub mod geometric_analysis;
pub mod grid_cleanup;
