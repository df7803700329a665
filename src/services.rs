// src/services.rs

pub mod access_control;
pub mod auth;
pub mod booking_lifecycle;
pub mod booking_service;
pub mod catalog_service;
pub mod notification;
pub mod project_service;
pub mod provider_matching;
pub mod provider_service;
