// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZeroMQ transport

pub mod dealer;

pub use dealer::{ZmqDealerConnector, ZmqDealerSession};
