//! Toolkit for the phoneme classification research workflow.
//!
//! * [`pipeline`] walks a tree of numeric datasets, computes natural breaks
//!   for each one and writes `res/<name>.jen` plus `figs/<name>.png`.
//! * [`data::confusion`] and [`render::heatmap`] turn the confusion matrix
//!   produced by the DTW executable into a heatmap.
//! * [`dtw`] launches the DTW executable and streams its output.
//! * [`analysis`] fits PCA, K-means and linear SVMs on MFCC feature tables.

pub mod analysis;
pub mod classify;
pub mod cli;
pub mod color;
pub mod config;
pub mod data;
pub mod dtw;
pub mod error;
pub mod pipeline;
pub mod render;
