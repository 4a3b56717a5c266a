//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{
    Currency, MAX_AMOUNT, MAX_BALANCE, MONEY_DECIMAL_PLACES, checked_money_add, round_money,
};
pub use pagination::{PageMeta, PageRequest, PageResponse};
