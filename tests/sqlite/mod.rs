#![cfg(feature = "rusqlite")]

mod dedup;
mod errors;
mod explain;
mod limit;
mod ordering;
mod separate;
