mod handlers;
mod models;
mod routes;

pub use routes::create_router;
