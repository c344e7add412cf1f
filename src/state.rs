// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::AuthConfig;
use crate::storage::TokenDatabase;
use crate::tokens::{TokenGenerator, TokenService};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<TokenDatabase>,
    pub tokens: Arc<TokenService>,
    pub auth_config: Arc<AuthConfig>,
}

impl AppState {
    /// Build the state around an opened database.
    ///
    /// Creates the process-wide token generator; every handler shares it.
    pub fn new(db: Arc<TokenDatabase>, auth_config: AuthConfig) -> Self {
        let tokens = TokenService::new(db.clone(), TokenGenerator::new());
        Self {
            db,
            tokens: Arc::new(tokens),
            auth_config: Arc::new(auth_config),
        }
    }
}
