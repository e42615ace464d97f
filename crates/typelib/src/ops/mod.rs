// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stateless algorithms over values.
//!
//! Every operation dispatches on the closed set of categories, so adding a
//! category is a compile error in each of them until it is handled.

mod copy;
mod csv;
mod endian;
mod equality;

pub use copy::{typed_copy, CopySource, CopyTarget};
pub use csv::{csv_header, csv_values, csv_values_of};
pub use endian::{endian_swap, swapped_bytes, SwapPlan, SwapRun};
pub use equality::{memory_equal, values_equal};
