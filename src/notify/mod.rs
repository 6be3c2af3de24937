// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Notification rendering and delivery.

pub mod delivery;
pub mod formatter;

pub use delivery::{DeliveryError, DeliveryReceipt, EmailDelivery, LogOnlyDelivery, OutboundEmail};
pub use formatter::{FormatError, NotificationFormatter, RenderedMessage, Template};
