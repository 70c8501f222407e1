use std::collections::{HashMap, HashSet};

use sqlx::PgPool;

use crate::db::models::Menu;
use crate::repositories;

#[derive(Debug, Clone)]
pub(crate) struct MenuNode {
    pub(crate) menu: Menu,
    pub(crate) children: Vec<MenuNode>,
}

pub(crate) async fn permissions_for(
    pool: &PgPool,
    account_id: &str,
) -> Result<HashSet<String>, sqlx::Error> {
    let names = repositories::permissions::names_for_account(pool, account_id).await?;
    Ok(names.into_iter().collect())
}

pub(crate) async fn menus_for(
    pool: &PgPool,
    account_id: &str,
    permissions: &HashSet<String>,
) -> Result<Vec<MenuNode>, sqlx::Error> {
    let menus = repositories::menus::visible_for_account(pool, account_id).await?;
    Ok(build_menu_tree(menus, permissions))
}

/// Assembles menus into a forest. Nodes whose parent is absent from
/// `menus` are dropped together with their subtrees, as are nodes guarded
/// by a permission the caller does not hold. Siblings are ordered by
/// `order_num`, then id.
pub(crate) fn build_menu_tree(menus: Vec<Menu>, permissions: &HashSet<String>) -> Vec<MenuNode> {
    let mut seen = HashSet::new();
    let mut by_parent: HashMap<Option<String>, Vec<Menu>> = HashMap::new();

    for menu in menus {
        if !seen.insert(menu.id.clone()) {
            continue;
        }
        let allowed = match menu.permission.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(permission) => permissions.contains(permission),
        };
        if allowed {
            by_parent.entry(menu.parent_id.clone()).or_default().push(menu);
        }
    }

    attach(None, &mut by_parent)
}

fn attach(
    parent_id: Option<String>,
    by_parent: &mut HashMap<Option<String>, Vec<Menu>>,
) -> Vec<MenuNode> {
    let Some(mut level) = by_parent.remove(&parent_id) else {
        return Vec::new();
    };
    level.sort_by(|a, b| a.order_num.cmp(&b.order_num).then_with(|| a.id.cmp(&b.id)));

    level
        .into_iter()
        .map(|menu| {
            let children = attach(Some(menu.id.clone()), by_parent);
            MenuNode { menu, children }
        })
        .collect()
}
