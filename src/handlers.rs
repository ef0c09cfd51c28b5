pub mod account;
pub mod auth;
pub mod health;
pub mod pages;
pub mod posts;
pub mod reset;
pub mod users;
