//! Account tree view over a flat account list.

use std::collections::{HashMap, HashSet};

use daftar_shared::types::AccountId;
use serde::Serialize;

use super::types::Account;

/// A node of the account forest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// The account at this node.
    pub account: Account,
    /// Child nodes ordered by code.
    pub children: Vec<TreeNode>,
    /// Depth from the root (roots are 0).
    pub level: usize,
    /// Set by [`search`] when a descendant matched.
    pub is_expanded: bool,
}

/// Builds the account forest.
///
/// Roots are top-level parent accounts followed by top-level leaf accounts,
/// each group ordered by code. An account whose parent is not in `accounts`
/// is treated as top-level.
#[must_use]
pub fn build_tree(accounts: &[Account]) -> Vec<TreeNode> {
    let known: HashSet<AccountId> = accounts.iter().map(|a| a.id).collect();
    let mut children: HashMap<AccountId, Vec<&Account>> = HashMap::new();
    let mut roots: Vec<&Account> = Vec::new();

    for account in accounts {
        match account.parent_id.filter(|p| known.contains(p)) {
            Some(parent_id) => children.entry(parent_id).or_default().push(account),
            None => roots.push(account),
        }
    }

    roots.sort_by(|a, b| b.is_parent.cmp(&a.is_parent).then_with(|| a.code.cmp(&b.code)));
    for list in children.values_mut() {
        list.sort_by(|a, b| a.code.cmp(&b.code));
    }

    let mut visited = HashSet::new();
    roots
        .into_iter()
        .filter_map(|root| build_node(root, &children, &mut visited, 0))
        .collect()
}

fn build_node(
    account: &Account,
    children: &HashMap<AccountId, Vec<&Account>>,
    visited: &mut HashSet<AccountId>,
    level: usize,
) -> Option<TreeNode> {
    if !visited.insert(account.id) {
        return None;
    }

    let child_nodes = children
        .get(&account.id)
        .map(|list| {
            list.iter()
                .filter_map(|child| build_node(child, children, visited, level + 1))
                .collect()
        })
        .unwrap_or_default();

    Some(TreeNode {
        account: account.clone(),
        children: child_nodes,
        level,
        is_expanded: false,
    })
}

/// Flattens the forest in pre-order.
#[must_use]
pub fn flatten(nodes: &[TreeNode]) -> Vec<&TreeNode> {
    let mut out = Vec::new();
    let mut stack: Vec<&TreeNode> = nodes.iter().rev().collect();

    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(node.children.iter().rev());
    }

    out
}

/// Keeps nodes whose code or name contains `term` (case-insensitive),
/// together with the ancestors of every match.
///
/// Ancestors kept only because a descendant matched are marked expanded.
/// A blank term returns the forest unchanged.
#[must_use]
pub fn search(nodes: &[TreeNode], term: &str) -> Vec<TreeNode> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return nodes.to_vec();
    }

    nodes.iter().filter_map(|node| search_node(node, &term)).collect()
}

fn search_node(node: &TreeNode, term: &str) -> Option<TreeNode> {
    let matches = node.account.code.to_lowercase().contains(term)
        || node.account.name.to_lowercase().contains(term);

    let children: Vec<TreeNode> = node
        .children
        .iter()
        .filter_map(|child| search_node(child, term))
        .collect();

    if !matches && children.is_empty() {
        return None;
    }

    Some(TreeNode {
        account: node.account.clone(),
        is_expanded: !children.is_empty(),
        children,
        level: node.level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountType, BalanceSide};
    use chrono::Utc;
    use daftar_shared::types::Currency;
    use rust_decimal::Decimal;

    fn account(code: &str, name: &str, is_parent: bool, parent: Option<&Account>) -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new(),
            code: code.into(),
            name: name.into(),
            account_type: AccountType::Asset,
            parent_id: parent.map(|p| p.id),
            is_parent,
            currency: Currency::Jod,
            normal_balance: BalanceSide::Debit,
            opening_balance: Decimal::ZERO,
            opening_balance_type: None,
            current_balance: Decimal::ZERO,
            has_transactions: false,
            created_by: "admin".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample() -> Vec<Account> {
        let assets = account("1000", "Current Assets", true, None);
        let bank = account("1002", "Bank", false, Some(&assets));
        let cash = account("1001", "Cash Box", false, Some(&assets));
        let loose = account("1501", "Deposits", false, None);
        let fixed = account("1100", "Fixed Assets", true, None);
        vec![loose, bank, assets, cash, fixed]
    }

    #[test]
    fn test_roots_parents_first_then_leaves() {
        let tree = build_tree(&sample());
        let codes: Vec<&str> = tree.iter().map(|n| n.account.code.as_str()).collect();
        assert_eq!(codes, vec!["1000", "1100", "1501"]);
    }

    #[test]
    fn test_children_sorted_with_levels() {
        let tree = build_tree(&sample());
        let children: Vec<(&str, usize)> = tree[0]
            .children
            .iter()
            .map(|n| (n.account.code.as_str(), n.level))
            .collect();
        assert_eq!(children, vec![("1001", 1), ("1002", 1)]);
    }

    #[test]
    fn test_missing_parent_becomes_root() {
        let ghost = account("1900", "Ghost", true, None);
        let orphan = account("1901", "Orphan", false, Some(&ghost));
        let tree = build_tree(&[orphan]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].level, 0);
    }

    #[test]
    fn test_flatten_pre_order() {
        let tree = build_tree(&sample());
        let codes: Vec<&str> = flatten(&tree)
            .iter()
            .map(|n| n.account.code.as_str())
            .collect();
        assert_eq!(codes, vec!["1000", "1001", "1002", "1100", "1501"]);
    }

    #[test]
    fn test_search_keeps_ancestors_expanded() {
        let tree = build_tree(&sample());
        let found = search(&tree, "cash");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].account.code, "1000");
        assert!(found[0].is_expanded);
        assert_eq!(found[0].children.len(), 1);
        assert_eq!(found[0].children[0].account.code, "1001");
        assert!(!found[0].children[0].is_expanded);
    }

    #[test]
    fn test_search_by_code_and_blank_term() {
        let tree = build_tree(&sample());
        assert_eq!(search(&tree, "1501").len(), 1);
        assert_eq!(search(&tree, "   ").len(), tree.len());
        assert!(search(&tree, "nothing").is_empty());
    }
}
