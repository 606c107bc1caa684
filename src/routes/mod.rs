pub mod booking_request_routes;
pub mod optimizer_routes;
pub mod trip_routes;
