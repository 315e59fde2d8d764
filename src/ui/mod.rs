pub mod output;
pub mod panels;
