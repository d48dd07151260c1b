//! # Kernel Configuration Constants
//!
//! Shared build-time knowledge about where things live in physical and
//! logical memory. Nothing in here allocates or touches hardware; other
//! crates source these constants so that boot code, the frame pools and the
//! paging subsystem agree on a single layout.

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod memory;
