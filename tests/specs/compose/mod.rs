// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job composition specs

mod degraded;
mod ordering;
mod packages;
