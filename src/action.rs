//! Action identifiers attached to inline buttons.
//!
//! Every callback payload the bot emits is produced by `Action`'s `Display`
//! impl and read back by [`Action::parse`], so both directions share the one
//! table below. Prefixes are tried longest first: `admin_view_cat_` must win
//! over any shorter `admin_` family, and ids may themselves contain `_`.

use std::fmt;

use teloxide::utils::command::BotCommands;

/// Slash commands understood by the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Commandes disponibles :")]
pub enum Command {
    #[command(description = "afficher le menu principal")]
    Start,
    #[command(description = "ouvrir le menu d'administration")]
    Admin,
    #[command(description = "afficher l'aide")]
    Help,
    #[command(description = "voir votre panier")]
    Cart,
}

/// Typed form of a callback payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    // Admin
    AdminMenu,
    AdminNewCategory,
    AdminNewProduct,
    AdminManageCategories,
    AdminManageProducts,
    AdminViewCategory(String),
    AdminViewProduct(String),
    NewProductInCategory(String),
    DeleteCategory(String),
    DeleteProduct(String),
    // Browsing
    Catalog,
    Menu,
    Help,
    Category(String),
    Product(String),
    // Cart
    Cart,
    AddToCart(String),
    RemoveFromCart(String),
    ClearCart,
    Checkout,
}

type IdAction = fn(String) -> Action;

/// Families carrying an id, longest prefix first
const ID_FAMILIES: &[(&str, IdAction)] = &[
    ("admin_view_prod_", Action::AdminViewProduct),
    ("admin_view_cat_", Action::AdminViewCategory),
    ("new_prod_cat_", Action::NewProductInCategory),
    ("del_prod_", Action::DeleteProduct),
    ("del_cat_", Action::DeleteCategory),
    ("category_", Action::Category),
    ("product_", Action::Product),
    ("remove_", Action::RemoveFromCart),
    ("add_", Action::AddToCart),
];

impl Action {
    /// Parse a callback payload. `None` for anything the bot never emits.
    pub fn parse(payload: &str) -> Option<Action> {
        let exact = match payload {
            "admin_menu" => Some(Action::AdminMenu),
            "admin_new_cat" => Some(Action::AdminNewCategory),
            "admin_new_prod" => Some(Action::AdminNewProduct),
            "admin_manage_cats" => Some(Action::AdminManageCategories),
            "admin_manage_prods" => Some(Action::AdminManageProducts),
            "catalog" => Some(Action::Catalog),
            "menu" => Some(Action::Menu),
            "help" => Some(Action::Help),
            "cart" => Some(Action::Cart),
            "clear_cart" => Some(Action::ClearCart),
            "checkout" => Some(Action::Checkout),
            _ => None,
        };
        if exact.is_some() {
            return exact;
        }

        ID_FAMILIES.iter().find_map(|(prefix, build)| {
            payload
                .strip_prefix(prefix)
                .filter(|id| !id.is_empty())
                .map(|id| build(id.to_string()))
        })
    }

    /// Whether only allowlisted admins may trigger this action
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Action::AdminMenu
                | Action::AdminNewCategory
                | Action::AdminNewProduct
                | Action::AdminManageCategories
                | Action::AdminManageProducts
                | Action::AdminViewCategory(_)
                | Action::AdminViewProduct(_)
                | Action::NewProductInCategory(_)
                | Action::DeleteCategory(_)
                | Action::DeleteProduct(_)
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::AdminMenu => write!(f, "admin_menu"),
            Action::AdminNewCategory => write!(f, "admin_new_cat"),
            Action::AdminNewProduct => write!(f, "admin_new_prod"),
            Action::AdminManageCategories => write!(f, "admin_manage_cats"),
            Action::AdminManageProducts => write!(f, "admin_manage_prods"),
            Action::AdminViewCategory(id) => write!(f, "admin_view_cat_{id}"),
            Action::AdminViewProduct(id) => write!(f, "admin_view_prod_{id}"),
            Action::NewProductInCategory(id) => write!(f, "new_prod_cat_{id}"),
            Action::DeleteCategory(id) => write!(f, "del_cat_{id}"),
            Action::DeleteProduct(id) => write!(f, "del_prod_{id}"),
            Action::Catalog => write!(f, "catalog"),
            Action::Menu => write!(f, "menu"),
            Action::Help => write!(f, "help"),
            Action::Category(id) => write!(f, "category_{id}"),
            Action::Product(id) => write!(f, "product_{id}"),
            Action::Cart => write!(f, "cart"),
            Action::AddToCart(id) => write!(f, "add_{id}"),
            Action::RemoveFromCart(id) => write!(f, "remove_{id}"),
            Action::ClearCart => write!(f, "clear_cart"),
            Action::Checkout => write!(f, "checkout"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_admin_prefixes() {
        assert_eq!(
            Action::parse("admin_view_cat_cat_1a2b3c4d"),
            Some(Action::AdminViewCategory("cat_1a2b3c4d".to_string()))
        );
        assert_eq!(
            Action::parse("admin_view_prod_prod_1a2b3c4d"),
            Some(Action::AdminViewProduct("prod_1a2b3c4d".to_string()))
        );
        assert_eq!(Action::parse("admin_menu"), Some(Action::AdminMenu));
    }

    #[test]
    fn test_ids_keep_their_underscores() {
        assert_eq!(
            Action::parse("del_cat_cat_0000beef"),
            Some(Action::DeleteCategory("cat_0000beef".to_string()))
        );
        assert_eq!(
            Action::parse("new_prod_cat_cat_0000beef"),
            Some(Action::NewProductInCategory("cat_0000beef".to_string()))
        );
        assert_eq!(
            Action::parse("remove_prod_0000beef"),
            Some(Action::RemoveFromCart("prod_0000beef".to_string()))
        );
    }

    #[test]
    fn test_unknown_payloads() {
        assert_eq!(Action::parse("admin_unknown"), None);
        assert_eq!(Action::parse("category_"), None);
        assert_eq!(Action::parse(""), None);
        assert_eq!(Action::parse("manage_prods_cat_cat_1"), None);
    }

    #[test]
    fn test_display_parses_back() {
        let actions = [
            Action::AdminManageProducts,
            Action::AdminViewCategory("cat_12345678".to_string()),
            Action::DeleteProduct("prod_12345678".to_string()),
            Action::Product("prod_12345678".to_string()),
            Action::ClearCart,
            Action::Checkout,
        ];
        for action in actions {
            assert_eq!(Action::parse(&action.to_string()), Some(action));
        }
    }

    #[test]
    fn test_admin_actions_are_flagged() {
        assert!(Action::DeleteCategory("cat_1".to_string()).requires_admin());
        assert!(Action::NewProductInCategory("cat_1".to_string()).requires_admin());
        assert!(!Action::AddToCart("prod_1".to_string()).requires_admin());
        assert!(!Action::Catalog.requires_admin());
    }
}
