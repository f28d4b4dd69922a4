use std::sync::Arc;

use log::info;

use agora::server::routes;
use agora::Server;

const DEFAULT_PORT: u16 = 2052;

#[tokio::main]
async fn main() {
    env_logger::init();

    let server = Arc::new(Server::new());
    let routes = routes(server);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    info!("agora listening on port {port}");
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}
