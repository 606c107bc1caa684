pub mod booking_request_repository;
pub mod id_counter_repository;
pub mod location_repository;
pub mod notification_repository;
pub mod schedule_repository;
pub mod setting_repository;
pub mod trip_repository;
pub mod trip_stop_repository;
pub mod trip_ticket_repository;
pub mod vehicle_repository;
