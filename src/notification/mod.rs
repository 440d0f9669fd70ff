pub mod notification_dto;
pub mod notification_handlers;
pub mod notification_models;
pub mod notification_repository;
pub mod notification_service;

pub use notification_models::{Notification, NotificationStatus, NotificationWithAgent};
pub use notification_repository::NotificationRepository;
pub use notification_service::NotificationService;
