// lib.rs
pub mod cluster;
pub mod commands;
pub mod error;
pub mod external;
pub mod faidx;
pub mod grouping;
pub mod hit_filter;
pub mod hits;
pub mod package;
pub mod region;
pub mod sequence_index;
pub mod window;
