pub mod availability_service;
pub mod batch_planner;
pub mod booking_request_service;
pub mod id_counter_service;
pub mod notification_service;
pub mod routing_service;
pub mod setting_service;
pub mod trip_matching_service;
pub mod trip_optimizer_service;
pub mod trip_service;
