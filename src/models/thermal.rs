//! Thermal systems models.
//!
//! This module contains the heat exchanger model used for the cycle's
//! recuperators, primary heat exchanger, and precooler.

pub mod hx;
