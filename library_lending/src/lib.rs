pub mod api;

#[cfg(any(feature = "client", test))]
pub mod client;

#[cfg(any(feature = "server", test))]
pub mod app_config;

#[cfg(any(feature = "server", test))]
pub mod authorization;

#[cfg(any(feature = "server", test))]
pub mod error;

#[cfg(any(feature = "server", test))]
mod handlers;

#[cfg(any(feature = "server", test))]
pub mod ledger;

#[cfg(any(feature = "server", test))]
pub mod library_repository;

#[cfg(any(feature = "server", test))]
pub mod library_service;

#[cfg(any(feature = "server", test))]
pub mod settings;
