//! Host-facing command contract, router and stdio bridge for front ends.

pub mod channel;
pub mod contract;
pub mod handler;
pub mod stdio;
