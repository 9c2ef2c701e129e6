//! Math utilities for the RC rover.
//!
//! This module provides drive mode selection and differential drive mixing for
//! two independently driven sides.

pub mod mixer;
