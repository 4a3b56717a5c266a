//! Chart of accounts.
//!
//! - `types` - accounts, account types, balance sides, inputs and filters
//! - `code` - per-type code ranges and code allocation
//! - `book` - in-memory account arena with change tracking
//! - `directory` - create, update, delete and read rules
//! - `tree` - forest view, flattening and search
//! - `cache` - read cache for account listings

pub mod book;
pub mod cache;
pub mod code;
pub mod directory;
pub mod tree;
pub mod types;

pub use book::{AccountBook, BookChanges};
pub use cache::AccountListCache;
pub use code::allocate_code;
pub use directory::AccountDirectory;
pub use tree::{TreeNode, build_tree, flatten, search};
pub use types::{
    Account, AccountDetail, AccountFilter, AccountType, BalanceSide, CreateAccountInput,
    UpdateAccountInput,
};
