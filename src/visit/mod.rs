pub mod visit_dto;
pub mod visit_handlers;
pub mod visit_models;
pub mod visit_repository;
pub mod visit_service;

pub use visit_models::{Visit, VisitDetail};
pub use visit_repository::VisitRepository;
pub use visit_service::VisitService;
