use crate::server::ServerRouter;
use axum::Router;

mod collect;

pub fn routes() -> ServerRouter {
    Router::new().merge(collect::routes())
}
