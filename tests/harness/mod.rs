// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for the request pipeline.
//!
//! Scripted stand-ins for the resolver, fetcher and reply channel that
//! count how often they are used.

#![allow(dead_code)]

pub mod fakes;
pub mod generators;
