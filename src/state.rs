// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::{accounts::AccountService, gateway::ResourceGateway};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: ResourceGateway,
    /// `None` when no identity admin credentials are configured.
    pub accounts: Option<AccountService>,
}

impl AppState {
    pub fn new(gateway: ResourceGateway) -> Self {
        Self {
            gateway,
            accounts: None,
        }
    }

    pub fn with_accounts(mut self, accounts: AccountService) -> Self {
        self.accounts = Some(accounts);
        self
    }
}
