// src/lib.rs — Library root for the TokenScript engine

pub mod cli;
pub mod core;
pub mod infra;
pub mod metadata;
pub mod repo;
pub mod storage;
