mod all_data;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/database";

/// Configures and returns the Actix scope for direct table browsing.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/all-data", get().to(all_data::process))
}
