//! # Simulated Machine Configuration
//!
//! This crate is the authoritative source for the geometry of the simulated
//! machine: address widths, page size, frame and page counts, and the depth
//! of the page-table tree. Every other crate in the workspace derives its
//! layout from these values, ensuring consistency and preventing
//! configuration drift.
//!
//! ## Configuration Management
//!
//! All values are `const` items computed at compile time:
//! * **Safety**: compile-time assertions reject invalid configurations
//!   (see the assertion block in [`memory`]).
//! * **Performance**: no runtime computation of layout information.
//! * **Consistency**: a single source of truth for the whole workspace.
//!
//! Changing the geometry means editing [`memory`] and rebuilding; there is
//! deliberately no runtime knob, so a binary always embodies exactly one
//! machine.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod memory;
