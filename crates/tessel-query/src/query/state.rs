//! Phantom types for the selection shape.
//!
//! These zero-sized types travel along the builder chain and decide, at
//! compile time, what a finished statement can decode.

use std::marker::PhantomData;

/// Exactly one column is selected and decodes into `T`.
pub struct Select1<T>(PhantomData<fn() -> T>);

/// Any number of columns are selected (`*` when none were named).
pub struct SelectN;
