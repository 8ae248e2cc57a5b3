//! # Action Router
//!
//! Turns one inbound chat event into catalog, cart or session changes and
//! the screens to show next. The router never talks to Telegram: it returns
//! an [`Outcome`] which the transport layer delivers.
//!
//! The sender's creation session is handed in with each event and the
//! change to apply to it comes back as [`Outcome::session`]; where sessions
//! are kept is up to the caller.
//!
//! Errors raised by any handler stop at [`Router::handle`]: they are logged
//! and replaced by a failure screen, so a bad event never takes the bot down.
//! Catalog mutations are staged and only applied once persisted, which keeps
//! a failed handler from leaving half-applied state behind.

use tracing::{debug, error, warn};

use crate::action::{Action, Command};
use crate::cart::{CartStore, ShopperId};
use crate::catalog::{Catalog, CatalogStore, Media};
use crate::config::BotConfig;
use crate::dialogue::{CreationSession, Draft, SessionInput, Step, Transition};
use crate::errors::{ShopError, ShopResult};
use crate::screens::{self, Screen};

/// Who sent an event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    pub id: ShopperId,
    pub first_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    Command(Command),
    /// Button press. `from_media_message` tells whether the pressed message
    /// is a photo/video, which cannot be edited into a text message.
    Callback {
        payload: String,
        from_media_message: bool,
    },
    Text(String),
    Media(Media),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub sender: Sender,
    pub kind: EventKind,
}

/// How a screen reaches the chat
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// New message
    Send(Screen),
    /// Edit the message the button belongs to
    Edit(Screen),
    /// Send a new message, then delete the one the button belongs to
    Replace(Screen),
}

impl Reply {
    pub fn screen(&self) -> &Screen {
        match self {
            Reply::Send(screen) | Reply::Edit(screen) | Reply::Replace(screen) => screen,
        }
    }
}

/// Short text shown when answering a callback query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub alert: bool,
}

/// What happens to the sender's creation session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionUpdate {
    #[default]
    Keep,
    Set(CreationSession),
    Clear,
}

/// Everything the transport has to do for one event
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub notice: Option<Notice>,
    pub replies: Vec<Reply>,
    pub session: SessionUpdate,
}

impl Outcome {
    fn reply(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            ..Self::default()
        }
    }

    fn with_session(mut self, session: SessionUpdate) -> Self {
        self.session = session;
        self
    }

    fn with_notice(mut self, text: &str, alert: bool) -> Self {
        self.notice = Some(Notice {
            text: text.to_string(),
            alert,
        });
        self
    }

    fn notice(text: &str, alert: bool) -> Self {
        Self::default().with_notice(text, alert)
    }
}

/// Owns the shop state and dispatches events to it
pub struct Router {
    config: BotConfig,
    catalog: CatalogStore,
    carts: CartStore,
}

impl Router {
    pub fn new(config: BotConfig, catalog: CatalogStore) -> Self {
        Self {
            config,
            catalog,
            carts: CartStore::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog.catalog()
    }

    pub fn carts(&self) -> &CartStore {
        &self.carts
    }

    pub fn is_admin(&self, user_id: ShopperId) -> bool {
        self.config.is_admin(user_id)
    }

    /// Process one event to completion given the sender's current session.
    /// Never fails.
    pub fn handle(&mut self, event: &Event, session: CreationSession) -> Outcome {
        match self.dispatch(event, session) {
            Ok(outcome) => outcome,
            Err(ShopError::Unauthorized) => {
                warn!(user_id = event.sender.id, "Refused admin action from non-admin user");
                Outcome::reply(present(event, screens::access_denied()))
            }
            Err(e) => {
                error!(user_id = event.sender.id, error = %e, "Failed to handle event");
                let home = if self.is_admin_context(event) {
                    Action::AdminMenu
                } else {
                    Action::Menu
                };
                let outcome = Outcome::reply(present(event, screens::failure(home)));
                match event.kind {
                    // Only a commit fails on text or media: its draft is dropped
                    EventKind::Text(_) | EventKind::Media(_) => outcome.with_session(SessionUpdate::Clear),
                    _ => outcome,
                }
            }
        }
    }

    fn is_admin_context(&self, event: &Event) -> bool {
        if !self.is_admin(event.sender.id) {
            return false;
        }
        match &event.kind {
            EventKind::Command(command) => *command == Command::Admin,
            EventKind::Callback { payload, .. } => {
                Action::parse(payload).is_some_and(|action| action.requires_admin())
            }
            EventKind::Text(_) | EventKind::Media(_) => true,
        }
    }

    fn dispatch(&mut self, event: &Event, session: CreationSession) -> ShopResult<Outcome> {
        match &event.kind {
            EventKind::Command(command) => self.on_command(&event.sender, command),
            EventKind::Callback {
                payload,
                from_media_message,
            } => {
                let Some(action) = Action::parse(payload) else {
                    warn!(user_id = event.sender.id, payload = %payload, "Unhandled callback payload");
                    return Ok(Outcome::default());
                };
                if action.requires_admin() && !self.is_admin(event.sender.id) {
                    return Err(ShopError::Unauthorized);
                }
                debug!(user_id = event.sender.id, action = %action, "Dispatching callback");
                self.on_action(&event.sender, action, *from_media_message)
            }
            EventKind::Text(text) => {
                if text.starts_with('/') {
                    debug!(user_id = event.sender.id, "Ignoring unknown command");
                    return Ok(Outcome::default());
                }
                self.on_session_input(&event.sender, session, SessionInput::Text(text.clone()))
            }
            EventKind::Media(media) => {
                self.on_session_input(&event.sender, session, SessionInput::Media(media.clone()))
            }
        }
    }

    fn on_command(&mut self, sender: &Sender, command: &Command) -> ShopResult<Outcome> {
        let screen = match command {
            Command::Start => screens::welcome(&sender.first_name),
            Command::Help => screens::help(),
            Command::Cart => screens::cart(self.carts.cart(sender.id), self.catalog.catalog())?,
            Command::Admin => {
                if !self.is_admin(sender.id) {
                    return Err(ShopError::Unauthorized);
                }
                return Ok(Outcome::reply(Reply::Send(screens::admin_menu()))
                    .with_session(SessionUpdate::Clear));
            }
        };
        Ok(Outcome::reply(Reply::Send(screen)))
    }

    fn on_action(&mut self, sender: &Sender, action: Action, from_media: bool) -> ShopResult<Outcome> {
        let show = |screen: Screen| -> ShopResult<Outcome> { Ok(Outcome::reply(navigate(screen, from_media))) };
        let catalog = self.catalog.catalog();

        match action {
            // Admin -----------------------------------------------------------
            Action::AdminMenu => {
                Ok(show(screens::admin_menu())?.with_session(SessionUpdate::Clear))
            }
            Action::AdminNewCategory => {
                debug!(user_id = sender.id, "Category creation started");
                Ok(show(screens::prompt(Step::CategoryName, None))?
                    .with_session(SessionUpdate::Set(CreationSession::AwaitingCategoryName)))
            }
            Action::AdminNewProduct => {
                if catalog.categories.is_empty() {
                    show(screens::category_required())
                } else {
                    show(screens::new_product_categories(catalog))
                }
            }
            Action::NewProductInCategory(category_id) => {
                let category = catalog
                    .find_category(&category_id)
                    .ok_or_else(|| ShopError::category_not_found(&category_id))?;
                let screen = screens::prompt(Step::ProductName, Some(&category.name));
                debug!(user_id = sender.id, "Product creation started");
                Ok(show(screen)?.with_session(SessionUpdate::Set(
                    CreationSession::AwaitingProductName { category_id },
                )))
            }
            Action::AdminManageCategories => show(screens::admin_categories(catalog)),
            Action::AdminManageProducts => show(screens::admin_products(catalog)),
            Action::AdminViewCategory(category_id) => {
                let category = catalog
                    .find_category(&category_id)
                    .ok_or_else(|| ShopError::category_not_found(&category_id))?;
                let products = catalog.products_in_category(&category_id);
                show(screens::admin_category_products(category, &products))
            }
            Action::AdminViewProduct(product_id) => {
                let product = catalog
                    .find_product(&product_id)
                    .ok_or_else(|| ShopError::product_not_found(&product_id))?;
                show(screens::admin_product(product))
            }
            Action::DeleteCategory(category_id) => {
                let (category, removed) = self.catalog.delete_category(&category_id)?;
                show(screens::category_deleted(&category, removed))
            }
            Action::DeleteProduct(product_id) => {
                let product = self.catalog.delete_product(&product_id)?;
                show(screens::product_deleted(&product))
            }

            // Browsing --------------------------------------------------------
            Action::Menu => show(screens::main_menu()),
            Action::Help => show(screens::help()),
            Action::Catalog => show(screens::catalog(catalog)),
            Action::Category(category_id) => {
                let category = catalog
                    .find_category(&category_id)
                    .ok_or_else(|| ShopError::category_not_found(&category_id))?;
                let products = catalog.products_in_category(&category_id);
                show(screens::category(category, &products))
            }
            Action::Product(product_id) => {
                let product = catalog
                    .find_product(&product_id)
                    .ok_or_else(|| ShopError::product_not_found(&product_id))?;
                let category = catalog.find_category(&product.category_id);
                show(screens::product(product, category, &self.config.contact_buttons))
            }

            // Cart ------------------------------------------------------------
            Action::Cart => show(screens::cart(self.carts.cart(sender.id), catalog)?),
            Action::AddToCart(product_id) => {
                let product = catalog
                    .find_product(&product_id)
                    .ok_or_else(|| ShopError::product_not_found(&product_id))?;
                if !product.in_stock() {
                    return Ok(Outcome::notice("❌ Produit en rupture de stock!", true));
                }
                self.carts.add_item(sender.id, &product_id, 1, catalog)?;
                Ok(Outcome::notice("✅ Produit ajouté au panier!", false))
            }
            Action::RemoveFromCart(product_id) => {
                self.carts.remove_item(sender.id, &product_id, 1);
                let screen = screens::cart(self.carts.cart(sender.id), catalog)?;
                Ok(Outcome::reply(navigate(screen, from_media))
                    .with_notice("✅ Produit retiré du panier!", false))
            }
            Action::ClearCart => {
                self.carts.clear(sender.id);
                let screen = screens::cart(self.carts.cart(sender.id), catalog)?;
                Ok(Outcome::reply(navigate(screen, from_media)).with_notice("✅ Panier vidé!", false))
            }
            Action::Checkout => {
                let cart = self.carts.cart(sender.id);
                // Lines of deleted products do not count
                if cart.map_or(true, |c| c.available_lines(catalog).is_empty()) {
                    return Ok(Outcome::reply(navigate(screens::cart(cart, catalog)?, from_media))
                        .with_notice("Votre panier est vide.", false));
                }
                show(screens::checkout(cart, catalog, &self.config.contact_buttons)?)
            }
        }
    }

    fn on_session_input(
        &mut self,
        sender: &Sender,
        session: CreationSession,
        input: SessionInput,
    ) -> ShopResult<Outcome> {
        if !self.is_admin(sender.id) {
            debug!(user_id = sender.id, "Dropping message from non-admin user");
            return Ok(Outcome::default());
        }
        if !session.is_active() {
            debug!(user_id = sender.id, "No creation in progress, dropping message");
            return Ok(Outcome::default());
        }

        match session.advance(input) {
            Transition::Ignored => Ok(Outcome::default()),
            Transition::Next(next) => {
                debug!(user_id = sender.id, step = ?next.step(), "Creation step completed");
                Ok(prompt_outcome(&next).with_session(SessionUpdate::Set(next)))
            }
            Transition::Retry(same, rejection) => {
                debug!(user_id = sender.id, rejection = ?rejection, "Creation input rejected");
                Ok(match same.step() {
                    Some(step) => Outcome::reply(Reply::Send(screens::retry(step, rejection))),
                    None => Outcome::default(),
                })
            }
            Transition::Complete(draft) => {
                Ok(self.commit(draft)?.with_session(SessionUpdate::Clear))
            }
        }
    }

    fn commit(&mut self, draft: Draft) -> ShopResult<Outcome> {
        let screen = match draft {
            Draft::Category { name } => {
                let category = self.catalog.create_category(&name)?;
                screens::category_created(&category)
            }
            Draft::Product(fields) => {
                let product = self.catalog.create_product(fields)?;
                screens::product_created(&product)
            }
        };
        Ok(Outcome::reply(Reply::Send(screen)))
    }
}

fn prompt_outcome(session: &CreationSession) -> Outcome {
    match session.step() {
        Some(step) => Outcome::reply(Reply::Send(screens::prompt(step, None))),
        None => Outcome::default(),
    }
}

/// Screen shown in answer to a button press. Media cannot be edited in or
/// out of a text message, so those cases replace the message instead.
fn navigate(screen: Screen, from_media_message: bool) -> Reply {
    if screen.media.is_some() || from_media_message {
        Reply::Replace(screen)
    } else {
        Reply::Edit(screen)
    }
}

/// Delivery mode for screens not produced by `on_action` (failures)
fn present(event: &Event, screen: Screen) -> Reply {
    match &event.kind {
        EventKind::Callback {
            from_media_message, ..
        } => navigate(screen, *from_media_message),
        _ => Reply::Send(screen),
    }
}
