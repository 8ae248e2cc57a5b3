//! Creation dialogue module for admin catalog editing.
//!
//! Each admin has at most one [`CreationSession`]. Text and media messages
//! from an admin are fed to [`CreationSession::advance`], which either moves
//! to the next step, asks again for the current one, or hands back a
//! complete draft for the catalog store to commit.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::catalog::{is_valid_price, Media, NewProduct};

/// Longest accepted name or description
pub const MAX_FIELD_LENGTH: usize = 255;

/// Represents the creation progress of one admin
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CreationSession {
    #[default]
    Idle,
    AwaitingCategoryName,
    AwaitingProductName {
        category_id: String,
    },
    AwaitingProductDescription {
        category_id: String,
        name: String,
    },
    AwaitingProductPrice {
        category_id: String,
        name: String,
        description: String,
    },
    AwaitingProductMedia {
        category_id: String,
        name: String,
        description: String,
        price: Decimal,
    },
}

/// The field a session is currently waiting for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    CategoryName,
    ProductName,
    ProductDescription,
    ProductPrice,
    ProductMedia,
}

/// Why an input was refused at the current step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    TooLong,
    InvalidPrice,
    ExpectedText,
    ExpectedMedia,
}

/// Inbound admin message relevant to a session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionInput {
    Text(String),
    Media(Media),
}

/// What the dialogue produced once every field is known
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Draft {
    Category { name: String },
    Product(NewProduct),
}

/// Result of feeding one input to a session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to do: the session is idle
    Ignored,
    /// Field accepted, ask for the next one
    Next(CreationSession),
    /// Field refused, ask again for the same step
    Retry(CreationSession, Rejection),
    /// All fields collected, the session ends
    Complete(Draft),
}

impl CreationSession {
    pub fn is_active(&self) -> bool {
        !matches!(self, CreationSession::Idle)
    }

    pub fn step(&self) -> Option<Step> {
        match self {
            CreationSession::Idle => None,
            CreationSession::AwaitingCategoryName => Some(Step::CategoryName),
            CreationSession::AwaitingProductName { .. } => Some(Step::ProductName),
            CreationSession::AwaitingProductDescription { .. } => Some(Step::ProductDescription),
            CreationSession::AwaitingProductPrice { .. } => Some(Step::ProductPrice),
            CreationSession::AwaitingProductMedia { .. } => Some(Step::ProductMedia),
        }
    }

    /// Feed one admin message to the session
    pub fn advance(self, input: SessionInput) -> Transition {
        match (self, input) {
            (CreationSession::Idle, _) => Transition::Ignored,

            (CreationSession::AwaitingCategoryName, SessionInput::Text(text)) => {
                match validate_field(&text) {
                    Ok(name) => Transition::Complete(Draft::Category { name }),
                    Err(rejection) => Transition::Retry(CreationSession::AwaitingCategoryName, rejection),
                }
            }

            (CreationSession::AwaitingProductName { category_id }, SessionInput::Text(text)) => {
                match validate_field(&text) {
                    Ok(name) => Transition::Next(CreationSession::AwaitingProductDescription {
                        category_id,
                        name,
                    }),
                    Err(rejection) => Transition::Retry(
                        CreationSession::AwaitingProductName { category_id },
                        rejection,
                    ),
                }
            }

            (
                CreationSession::AwaitingProductDescription { category_id, name },
                SessionInput::Text(text),
            ) => match validate_field(&text) {
                Ok(description) => Transition::Next(CreationSession::AwaitingProductPrice {
                    category_id,
                    name,
                    description,
                }),
                Err(rejection) => Transition::Retry(
                    CreationSession::AwaitingProductDescription { category_id, name },
                    rejection,
                ),
            },

            (
                CreationSession::AwaitingProductPrice {
                    category_id,
                    name,
                    description,
                },
                SessionInput::Text(text),
            ) => match parse_price(&text) {
                Some(price) => Transition::Next(CreationSession::AwaitingProductMedia {
                    category_id,
                    name,
                    description,
                    price,
                }),
                None => Transition::Retry(
                    CreationSession::AwaitingProductPrice {
                        category_id,
                        name,
                        description,
                    },
                    Rejection::InvalidPrice,
                ),
            },

            (
                CreationSession::AwaitingProductMedia {
                    category_id,
                    name,
                    description,
                    price,
                },
                input,
            ) => {
                let media = match input {
                    SessionInput::Media(media) => Some(media),
                    SessionInput::Text(text) if is_skip(&text) => None,
                    SessionInput::Text(_) => {
                        return Transition::Retry(
                            CreationSession::AwaitingProductMedia {
                                category_id,
                                name,
                                description,
                                price,
                            },
                            Rejection::ExpectedMedia,
                        )
                    }
                };
                Transition::Complete(Draft::Product(NewProduct {
                    category_id,
                    name,
                    description,
                    price,
                    media,
                }))
            }

            // Media sent while a text field is expected
            (session, SessionInput::Media(_)) => Transition::Retry(session, Rejection::ExpectedText),
        }
    }
}

/// Trim a name or description and check its length
pub fn validate_field(input: &str) -> Result<String, Rejection> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(Rejection::Empty);
    }

    if trimmed.chars().count() > MAX_FIELD_LENGTH {
        return Err(Rejection::TooLong);
    }

    Ok(trimmed.to_string())
}

/// Parse a price accepting `,` as decimal separator. Negative amounts, more
/// than cents or more than [`MAX_PRICE`](crate::catalog::MAX_PRICE) are refused.
pub fn parse_price(input: &str) -> Option<Decimal> {
    let normalized = input.trim().replace(',', ".");
    let price = Decimal::from_str(&normalized).ok()?.normalize();
    is_valid_price(price).then_some(price)
}

fn is_skip(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("skip")
}
