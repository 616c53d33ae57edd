//! REST-Handler Module

pub mod auth;
pub mod organisationen;
