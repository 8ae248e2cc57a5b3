//! Screens module: pure rendering of domain state into text and buttons.
//!
//! Nothing here talks to Telegram. A [`Screen`] is HTML text plus a
//! declarative button grid and, for product pages, the media to show; the
//! transport layer turns it into API calls.

use rust_decimal::Decimal;
use teloxide::utils::html::escape;

use crate::action::Action;
use crate::cart::{line_total, sum_amounts, Cart};
use crate::catalog::{Catalog, Category, Media, Product, MAX_PRICE};
use crate::config::ContactButton;
use crate::dialogue::{Rejection, Step, MAX_FIELD_LENGTH};
use crate::errors::ShopResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Button {
    Callback { label: String, action: Action },
    Url { label: String, url: String },
}

pub type Keyboard = Vec<Vec<Button>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub keyboard: Keyboard,
    pub media: Option<Media>,
}

impl Screen {
    fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
            media: None,
        }
    }

    /// Every callback action reachable from this screen, row by row
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.keyboard.iter().flatten().filter_map(|button| match button {
            Button::Callback { action, .. } => Some(action),
            Button::Url { .. } => None,
        })
    }
}

fn button(label: impl Into<String>, action: Action) -> Button {
    Button::Callback {
        label: label.into(),
        action,
    }
}

fn menu_button() -> Button {
    button("🏠 MENU", Action::Menu)
}

fn catalog_button() -> Button {
    button("📚 CATALOGUE", Action::Catalog)
}

fn admin_back_row() -> Vec<Button> {
    vec![button("⬅️ Retour", Action::AdminMenu)]
}

fn cancel_row() -> Vec<Button> {
    vec![button("⬅️ Annuler", Action::AdminMenu)]
}

fn contact_rows(contacts: &[ContactButton]) -> Keyboard {
    contacts
        .iter()
        .map(|contact| {
            vec![Button::Url {
                label: contact.text.clone(),
                url: contact.url.clone(),
            }]
        })
        .collect()
}

pub fn format_price(price: Decimal) -> String {
    format!("{:.2}€", price.round_dp(2))
}

// ---------------------------------------------------------------------------
// Shopper screens
// ---------------------------------------------------------------------------

fn main_keyboard() -> Keyboard {
    vec![
        vec![catalog_button()],
        vec![button("🛒 PANIER", Action::Cart)],
        vec![button("❓ AIDE", Action::Help)],
    ]
}

/// Greeting sent on `/start`
pub fn welcome(first_name: &str) -> Screen {
    let text = format!(
        "👋 <b>Bienvenue {} !</b>\n\n\
         Je suis votre catalogue personnel.\n\n\
         <b>Que souhaitez-vous voir ?</b>\n\
         • 📚 Explorer le catalogue\n\
         • 🛒 Consulter votre panier\n\
         • ❓ Obtenir de l'aide",
        escape(first_name)
    );
    Screen::new(text, main_keyboard())
}

pub fn main_menu() -> Screen {
    Screen::new(
        "<b>🏠 MENU PRINCIPAL</b>\n\nQue souhaitez-vous voir ?",
        main_keyboard(),
    )
}

pub fn help() -> Screen {
    Screen::new(
        "<b>❓ AIDE</b>\n\n\
         Comment utiliser le bot :\n\n\
         • 📚 <b>Catalogue :</b> Parcourez nos produits\n\
         • 🔍 <b>Produit :</b> Cliquez sur un produit pour voir les détails\n\
         • 🛒 <b>Panier :</b> Ajoutez des produits puis passez commande\n\
         • 💬 <b>Contact :</b> Utilisez les boutons sous chaque produit\n\n\
         Pour toute question, contactez-nous via les boutons fournis.",
        vec![vec![menu_button()]],
    )
}

/// Category list, two buttons per row
pub fn catalog(catalog: &Catalog) -> Screen {
    let mut keyboard: Keyboard = catalog
        .categories
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|c| button(c.name.clone(), Action::Category(c.id.clone())))
                .collect()
        })
        .collect();
    keyboard.push(vec![menu_button()]);

    let text = if catalog.categories.is_empty() {
        "<b>📚 CATALOGUE</b>\n\nAucune catégorie pour le moment."
    } else {
        "<b>📚 CATALOGUE</b>\n\nChoisissez une catégorie :"
    };
    Screen::new(text, keyboard)
}

/// Products of one category, one per row
pub fn category(category: &Category, products: &[&Product]) -> Screen {
    let text = format!(
        "<b>{}</b>\n\n{}\n\n📦 {} produits disponibles",
        escape(&category.name),
        escape(&category.description),
        products.len()
    );

    let mut keyboard: Keyboard = products
        .iter()
        .map(|p| vec![button(format!("🔍 {}", p.name), Action::Product(p.id.clone()))])
        .collect();
    keyboard.push(vec![catalog_button(), menu_button()]);

    Screen::new(text, keyboard)
}

/// Product page, carrying the product media when there is one
pub fn product(product: &Product, category: Option<&Category>, contacts: &[ContactButton]) -> Screen {
    let mut text = format!(
        "<b>{}</b>\n\n📝 <b>Description :</b>\n{}\n\n💰 <b>Prix :</b> {}",
        escape(&product.name),
        escape(&product.description),
        format_price(product.price)
    );
    if let Some(category) = category {
        text.push_str(&format!("\n🏷️ <b>Catégorie :</b> {}", escape(&category.name)));
    }
    if !product.in_stock() {
        text.push_str("\n\n❌ <i>Rupture de stock</i>");
    }

    let mut keyboard = contact_rows(contacts);
    keyboard.push(vec![button(
        "🛒 Ajouter au panier",
        Action::AddToCart(product.id.clone()),
    )]);
    keyboard.push(vec![
        button("◀️ Retour", Action::Category(product.category_id.clone())),
        menu_button(),
    ]);

    Screen {
        text,
        keyboard,
        media: product.media.clone(),
    }
}

fn resolved_lines<'a>(cart: Option<&'a Cart>, catalog: &'a Catalog) -> Vec<(&'a Product, u32)> {
    cart.map(|cart| cart.available_lines(catalog)).unwrap_or_default()
}

fn cart_summary(lines: &[(&Product, u32)]) -> ShopResult<String> {
    let mut text = String::new();
    let mut subtotals = Vec::with_capacity(lines.len());
    for (product, quantity) in lines {
        let subtotal = line_total(product.price, *quantity)?;
        subtotals.push(subtotal);
        text.push_str(&format!(
            "• {}\n  └ {}× {} = {}\n\n",
            escape(&product.name),
            quantity,
            format_price(product.price),
            format_price(subtotal)
        ));
    }
    let total = sum_amounts(subtotals)?;
    text.push_str(&format!("\n💰 <b>Total :</b> {}", format_price(total)));
    Ok(text)
}

/// Cart contents. Fails only when an amount does not fit a `Decimal`.
pub fn cart(cart: Option<&Cart>, catalog: &Catalog) -> ShopResult<Screen> {
    let lines = resolved_lines(cart, catalog);
    let nav_row = vec![catalog_button(), menu_button()];

    if lines.is_empty() {
        return Ok(Screen::new(
            "<b>🛒 PANIER</b>\n\n\
             Votre panier est vide.\n\n\
             <i>Parcourez notre catalogue pour ajouter des produits !</i>",
            vec![nav_row],
        ));
    }

    let text = format!("<b>🛒 PANIER</b>\n\n{}", cart_summary(&lines)?);

    let mut keyboard: Keyboard = lines
        .iter()
        .map(|(product, _)| {
            vec![
                button(format!("➖ {}", product.name), Action::RemoveFromCart(product.id.clone())),
                button("➕", Action::AddToCart(product.id.clone())),
            ]
        })
        .collect();
    keyboard.push(vec![button("🗑️ Vider le panier", Action::ClearCart)]);
    keyboard.push(vec![button("💳 Commander", Action::Checkout)]);
    keyboard.push(nav_row);

    Ok(Screen::new(text, keyboard))
}

/// Order recap; the order itself is finalised through the contact links
pub fn checkout(cart: Option<&Cart>, catalog: &Catalog, contacts: &[ContactButton]) -> ShopResult<Screen> {
    let lines = resolved_lines(cart, catalog);
    let text = format!(
        "<b>💳 COMMANDE</b>\n\n{}\n\n\
         Pour finaliser votre commande, contactez-nous via les boutons ci-dessous.",
        cart_summary(&lines)?
    );

    let mut keyboard = contact_rows(contacts);
    keyboard.push(vec![button("🛒 PANIER", Action::Cart), menu_button()]);
    Ok(Screen::new(text, keyboard))
}

// ---------------------------------------------------------------------------
// Admin screens
// ---------------------------------------------------------------------------

pub fn admin_menu() -> Screen {
    Screen::new(
        "<b>👑 MENU ADMINISTRATION</b>\n\nChoisissez une action :",
        vec![
            vec![button("➕ Nouvelle Catégorie", Action::AdminNewCategory)],
            vec![button("➕ Nouveau Produit", Action::AdminNewProduct)],
            vec![button("🗑️ Gérer Catégories", Action::AdminManageCategories)],
            vec![button("🗑️ Gérer Produits", Action::AdminManageProducts)],
        ],
    )
}

pub fn admin_categories(catalog: &Catalog) -> Screen {
    let mut keyboard: Keyboard = catalog
        .categories
        .iter()
        .map(|c| {
            vec![
                button(format!("📁 {}", c.name), Action::AdminViewCategory(c.id.clone())),
                button("🗑️", Action::DeleteCategory(c.id.clone())),
            ]
        })
        .collect();
    keyboard.push(admin_back_row());

    Screen::new(
        "<b>🗂️ GÉRER LES CATÉGORIES</b>\n\n\
         Cliquez sur 🗑️ pour supprimer une catégorie\n\
         ⚠️ La suppression supprimera aussi tous les produits associés",
        keyboard,
    )
}

pub fn admin_products(catalog: &Catalog) -> Screen {
    let mut keyboard: Keyboard = catalog
        .categories
        .iter()
        .map(|c| vec![button(format!("📁 {}", c.name), Action::AdminViewCategory(c.id.clone()))])
        .collect();
    keyboard.push(admin_back_row());

    Screen::new(
        "<b>📦 GÉRER LES PRODUITS</b>\n\nChoisissez une catégorie :",
        keyboard,
    )
}

pub fn admin_category_products(category: &Category, products: &[&Product]) -> Screen {
    let text = format!(
        "<b>📦 PRODUITS DE {}</b>\n\nCliquez sur 🗑️ pour supprimer un produit",
        escape(&category.name.to_uppercase())
    );

    let mut keyboard: Keyboard = products
        .iter()
        .map(|p| {
            vec![
                button(format!("🏷️ {}", p.name), Action::AdminViewProduct(p.id.clone())),
                button("🗑️", Action::DeleteProduct(p.id.clone())),
            ]
        })
        .collect();
    keyboard.push(vec![button(
        "➕ Nouveau produit",
        Action::NewProductInCategory(category.id.clone()),
    )]);
    keyboard.push(vec![button("⬅️ Retour", Action::AdminManageCategories)]);

    Screen::new(text, keyboard)
}

pub fn admin_product(product: &Product) -> Screen {
    let media = match &product.media {
        Some(media) => format!("{:?}", media.kind).to_lowercase(),
        None => "aucun".to_string(),
    };
    let stock = product
        .stock
        .map_or_else(|| "non suivi".to_string(), |s| s.to_string());
    let text = format!(
        "<b>🏷️ {}</b>\n\n{}\n\n💰 <b>Prix :</b> {}\n📸 <b>Média :</b> {}\n📦 <b>Stock :</b> {}\n🆔 <code>{}</code>",
        escape(&product.name),
        escape(&product.description),
        format_price(product.price),
        media,
        stock,
        escape(&product.id)
    );

    Screen::new(
        text,
        vec![
            vec![button("🗑️ Supprimer", Action::DeleteProduct(product.id.clone()))],
            vec![button(
                "⬅️ Retour",
                Action::AdminViewCategory(product.category_id.clone()),
            )],
        ],
    )
}

/// Category picker shown when starting a product
pub fn new_product_categories(catalog: &Catalog) -> Screen {
    let mut keyboard: Keyboard = catalog
        .categories
        .iter()
        .map(|c| vec![button(format!("📁 {}", c.name), Action::NewProductInCategory(c.id.clone()))])
        .collect();
    keyboard.push(admin_back_row());

    Screen::new(
        "<b>🆕 Création d'un nouveau produit</b>\n\nSélectionnez la catégorie :",
        keyboard,
    )
}

pub fn category_required() -> Screen {
    Screen::new(
        "❌ Vous devez d'abord créer une catégorie.",
        vec![
            vec![button("➕ Créer une catégorie", Action::AdminNewCategory)],
            admin_back_row(),
        ],
    )
}

// ---------------------------------------------------------------------------
// Creation dialogue
// ---------------------------------------------------------------------------

/// Prompt for a creation step. `category_name` is shown when a product is started.
pub fn prompt(step: Step, category_name: Option<&str>) -> Screen {
    let text = match step {
        Step::CategoryName => {
            "🏷️ <b>Création d'une nouvelle catégorie</b>\n\nEnvoyez le nom de la catégorie :".to_string()
        }
        Step::ProductName => format!(
            "📝 <b>Création d'un produit dans {}</b>\n\nEnvoyez le nom du produit :",
            escape(category_name.unwrap_or("la catégorie"))
        ),
        Step::ProductDescription => "📝 Maintenant, envoyez la description du produit :".to_string(),
        Step::ProductPrice => "💰 Envoyez le prix du produit (exemple: 99.99) :".to_string(),
        Step::ProductMedia => {
            "📸 Envoyez une photo ou vidéo du produit\nou tapez 'skip' pour passer cette étape".to_string()
        }
    };
    Screen::new(text, vec![cancel_row()])
}

/// Re-prompt after a refused input; the session stays on `step`
pub fn retry(step: Step, rejection: Rejection) -> Screen {
    let reason = match rejection {
        Rejection::InvalidPrice => format!(
            "❌ Prix invalide : de 0 à {MAX_PRICE}, deux décimales maximum. Réessayez (exemple: 99.99) :"
        ),
        Rejection::Empty => "❌ Ce champ ne peut pas être vide. Réessayez :".to_string(),
        Rejection::TooLong => format!("❌ Texte trop long ({MAX_FIELD_LENGTH} caractères maximum). Réessayez :"),
        Rejection::ExpectedText => "❌ Cette étape attend un texte.".to_string(),
        Rejection::ExpectedMedia => "❌ Envoyez une photo, une vidéo, ou tapez 'skip'.".to_string(),
    };

    match rejection {
        Rejection::ExpectedText => {
            let prompt = prompt(step, None);
            Screen::new(format!("{reason}\n\n{}", prompt.text), prompt.keyboard)
        }
        _ => Screen::new(reason, vec![cancel_row()]),
    }
}

fn admin_done_row() -> Vec<Button> {
    vec![button("👑 Menu admin", Action::AdminMenu)]
}

pub fn category_created(category: &Category) -> Screen {
    Screen::new(
        format!("✅ Catégorie <b>{}</b> créée avec succès!", escape(&category.name)),
        vec![admin_done_row()],
    )
}

pub fn product_created(product: &Product) -> Screen {
    Screen::new(
        format!("✅ Produit <b>{}</b> créé avec succès!", escape(&product.name)),
        vec![
            vec![button(
                "📦 Voir la catégorie",
                Action::AdminViewCategory(product.category_id.clone()),
            )],
            admin_done_row(),
        ],
    )
}

pub fn category_deleted(category: &Category, products_removed: usize) -> Screen {
    Screen::new(
        format!(
            "✅ Catégorie <b>{}</b> supprimée avec succès ({} produit(s) supprimé(s)).",
            escape(&category.name),
            products_removed
        ),
        vec![vec![button("⬅️ Retour", Action::AdminManageCategories)]],
    )
}

pub fn product_deleted(product: &Product) -> Screen {
    Screen::new(
        format!("✅ Produit <b>{}</b> supprimé avec succès.", escape(&product.name)),
        vec![vec![button(
            "⬅️ Retour",
            Action::AdminViewCategory(product.category_id.clone()),
        )]],
    )
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Generic failure screen with a way back to `home`
pub fn failure(home: Action) -> Screen {
    Screen::new(
        "❌ Une erreur est survenue.",
        vec![vec![button("⬅️ Retour au menu", home)]],
    )
}

pub fn access_denied() -> Screen {
    Screen::new("⛔️ Accès non autorisé", vec![vec![menu_button()]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MediaKind;
    use std::str::FromStr;

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("Catégorie {name}"),
        }
    }

    fn product(id: &str, media: Option<Media>) -> Product {
        Product {
            id: id.to_string(),
            category_id: "cat_1".to_string(),
            name: "Cola <zero>".to_string(),
            description: "Fizzy".to_string(),
            price: Decimal::from_str("2.5").unwrap(),
            media,
            stock: None,
        }
    }

    #[test]
    fn test_catalog_lays_out_two_categories_per_row() {
        let catalog = Catalog {
            categories: vec![category("cat_1", "A"), category("cat_2", "B"), category("cat_3", "C")],
            products: Vec::new(),
        };
        let screen = super::catalog(&catalog);

        let widths: Vec<usize> = screen.keyboard.iter().map(Vec::len).collect();
        assert_eq!(widths, vec![2, 1, 1]);
        assert_eq!(screen.actions().next(), Some(&Action::Category("cat_1".to_string())));
    }

    #[test]
    fn test_product_page_escapes_and_carries_media() {
        let media = Media {
            id: "AgAD".to_string(),
            kind: MediaKind::Photo,
        };
        let contacts = vec![ContactButton {
            text: "📱 Contact".to_string(),
            url: "https://t.me/shop".to_string(),
        }];
        let screen = super::product(&product("prod_1", Some(media.clone())), None, &contacts);

        assert!(screen.text.contains("Cola &lt;zero&gt;"));
        assert!(screen.text.contains("2.50€"));
        assert_eq!(screen.media, Some(media));
        assert!(matches!(&screen.keyboard[0][0], Button::Url { url, .. } if url == "https://t.me/shop"));
        assert!(screen
            .actions()
            .any(|a| *a == Action::AddToCart("prod_1".to_string())));
    }

    #[test]
    fn test_empty_cart_has_no_checkout() {
        let screen = super::cart(None, &Catalog::default()).unwrap();
        assert!(screen.text.contains("Votre panier est vide"));
        assert!(!screen.actions().any(|a| *a == Action::Checkout));
    }

    #[test]
    fn test_cart_amount_overflow_is_an_error() {
        use crate::cart::CartStore;

        let mut huge = product("prod_1", None);
        huge.price = Decimal::MAX;
        let catalog = Catalog {
            categories: vec![category("cat_1", "A")],
            products: vec![huge],
        };
        let mut carts = CartStore::new();
        carts.add_item(1, "prod_1", 8, &catalog).unwrap();

        assert!(super::cart(carts.cart(1), &catalog).is_err());
        assert!(super::checkout(carts.cart(1), &catalog, &[]).is_err());
    }

    #[test]
    fn test_price_formatting() {
        assert_eq!(format_price(Decimal::from_str("99.99").unwrap()), "99.99€");
        assert_eq!(format_price(Decimal::from(3)), "3.00€");
    }
}
