pub mod booking_request_controller;
pub mod optimizer_controller;
pub mod trip_controller;
