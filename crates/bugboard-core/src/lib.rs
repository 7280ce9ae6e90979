//! Core types and the authorization-and-voting logic of the bug board.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! request flow it supports is: build a [`context::RequestContext`], run the
//! coarse gate ([`policy`]), load the record through a [`store::BoardStore`],
//! run the fine gate ([`guard`]), then apply the effect (or [`vote::toggle`]
//! for upvotes).

pub mod context;
pub mod error;
pub mod guard;
pub mod identity;
pub mod policy;
pub mod record;
pub mod store;
pub mod vote;

pub use error::{Error, ErrorKind, Result};
