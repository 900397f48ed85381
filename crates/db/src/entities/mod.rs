//! `SeaORM` entity definitions.

pub mod anomalies;
pub mod categories;
pub mod companies;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
