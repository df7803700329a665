// src/handlers.rs

pub mod accounts;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod projects;
pub mod providers;
pub mod services;
