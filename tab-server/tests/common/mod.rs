//! 集成测试公共设置
#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::models::{MenuItemId, MenuOffer, PaymentMethod, PaymentMethodId, Restaurant, RestaurantId, UserId};
use tab_server::auth::{CurrentUser, JwtConfig};
use tab_server::catalog::FixtureCatalog;
use tab_server::tabs::TabStorage;
use tab_server::{Config, ServerState};
use tempfile::TempDir;

pub const ALICE: UserId = 1;
pub const BOB: UserId = 2;
pub const MANAGER: UserId = 9;
pub const OSTERIA: RestaurantId = 100;
pub const TRATTORIA: RestaurantId = 200;
pub const NEGRONI: MenuItemId = 10;
pub const TIRAMISU: MenuItemId = 11;
pub const SOLD_OUT: MenuItemId = 12;
pub const ALICE_CARD: PaymentMethodId = 500;
pub const BOB_CARD: PaymentMethodId = 501;

/// Server state backed by a redb file in a temporary directory
pub struct TestEnv {
    pub state: ServerState,
    pub catalog: Arc<FixtureCatalog>,
    // Dropped last; removes the database file
    _dir: TempDir,
}

pub fn user(id: UserId) -> CurrentUser {
    CurrentUser {
        id,
        username: format!("user-{}", id),
        role: if id == MANAGER { "manager" } else { "customer" }.into(),
    }
}

pub fn seed_catalog() -> FixtureCatalog {
    let catalog = FixtureCatalog::new();
    catalog.upsert_restaurant(Restaurant {
        id: OSTERIA,
        name: "Osteria".into(),
        manager_ids: vec![MANAGER],
    });
    catalog.upsert_restaurant(Restaurant {
        id: TRATTORIA,
        name: "Trattoria".into(),
        manager_ids: vec![],
    });
    for (menu_item_id, name, cents, available) in [
        (NEGRONI, "Negroni", 850, true),
        (TIRAMISU, "Tiramisu", 600, true),
        (SOLD_OUT, "Truffle pasta", 2400, false),
    ] {
        catalog.upsert_menu_offer(MenuOffer {
            menu_item_id,
            restaurant_id: OSTERIA,
            name: name.into(),
            item_type: None,
            price: Decimal::new(cents, 2),
            available,
        });
    }
    catalog.upsert_payment_method(PaymentMethod {
        id: ALICE_CARD,
        user_id: ALICE,
        label: Some("visa".into()),
    });
    catalog.upsert_payment_method(PaymentMethod {
        id: BOB_CARD,
        user_id: BOB,
        label: None,
    });
    catalog
}

pub fn setup() -> TestEnv {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::with_overrides(
        dir.path().to_string_lossy().to_string(),
        0,
        JwtConfig::with_secret("integration-test-secret-0123456789abcdef"),
    );
    let storage = TabStorage::open(config.database_path()).expect("open storage");
    let catalog = Arc::new(seed_catalog());
    let state = ServerState::with_parts(config, storage, catalog.clone(), catalog.clone());
    TestEnv {
        state,
        catalog,
        _dir: dir,
    }
}

pub fn token_for(env: &TestEnv, user_id: UserId) -> String {
    let user = user(user_id);
    env.state
        .jwt_service
        .generate_token(user.id, &user.username, &user.role)
        .expect("token")
}
