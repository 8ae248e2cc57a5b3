//! # Storefront Telegram Bot
//!
//! A Telegram bot presenting a product catalog: shoppers browse categories and
//! products and fill a cart, admins create and delete categories and products
//! through guided multi-step dialogues.

pub mod action;
pub mod bot;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod dialogue;
pub mod errors;
pub mod router;
pub mod screens;
pub mod storage;
