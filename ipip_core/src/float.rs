// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Float helpers for `no_std` builds.
//!
//! `f64::log10` and friends live in `std`, not `core`. The log axis and the
//! label formatter only need a couple of them, routed through `libm` here.

/// Float math helpers for `f64` in `no_std` mode.
pub(crate) trait FloatExt {
    fn log10(self) -> Self;
    fn trunc(self) -> Self;
}

#[cfg(all(not(feature = "std"), feature = "libm"))]
impl FloatExt for f64 {
    fn log10(self) -> Self {
        libm::log10(self)
    }

    fn trunc(self) -> Self {
        libm::trunc(self)
    }
}

#[cfg(all(not(feature = "std"), not(feature = "libm")))]
compile_error!("ipip_core requires either the `std` or `libm` feature");
