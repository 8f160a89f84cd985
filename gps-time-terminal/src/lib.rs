//! host side collaborators for running the gps time core on a laptop.
//!
//! the receiver and its pulse are simulated (or replayed from a capture), the network is plain
//! tcp with just enough HTTP to make a browser happy.
pub mod config;
pub mod indicator;
pub mod serial;
pub mod simulator;
pub mod transport;
