pub mod stats_handlers;
pub mod stats_models;
pub mod stats_repository;
pub mod stats_service;

pub use stats_repository::StatsRepository;
pub use stats_service::StatsService;
