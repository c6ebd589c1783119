//! Construction Phase
//!
//! Elements are collected by the [`ModelBuilder`] and checked by the
//! validator. Nothing downstream of a [`Model`](crate::Model) re-validates.

mod builder;
pub(crate) mod validator;

pub use builder::ModelBuilder;
