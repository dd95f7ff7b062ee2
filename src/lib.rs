//! Bio Check Bot Library
//!
//! A Telegram bot that bulk-checks WhatsApp about/bio text.
//!
//! This crate provides the core functionality for:
//! - Extracting and deduplicating phone numbers from messages and text files
//! - Checking registration and fetching bios through a WhatsApp bridge
//! - Streaming rate-limited progress into an edited chat message
//! - Owner and premium access control backed by a JSON allowlist

pub mod access;
pub mod check;
pub mod commands;
pub mod config;
pub mod numbers;
pub mod progress;
pub mod telegram;
pub mod whatsapp;
