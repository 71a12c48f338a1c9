//! ClinicRoute: multi-tenant referral and insurer-authorisation workflow API
//! for UK healthcare clinics.
//!
//! Layered architecture: handlers validate and route, services apply the
//! workflow rules, repository traits abstract the relational store.

pub mod app;
pub mod config;
pub mod domain;
pub mod handlers;
pub mod infrastructure;
pub mod middleware;
pub mod services;
pub mod shared;
