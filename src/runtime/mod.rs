//! Runtime system
//!
//! This module contains the cooperative scheduler and the pieces it is built
//! from: object recycling, phases, time sources and the host frame contract.

pub mod clock;
pub mod host;
pub mod phase;
pub mod pool;
pub mod scheduler;
