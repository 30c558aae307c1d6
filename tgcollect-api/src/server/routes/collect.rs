use crate::server::{Result, ServerRouter, json::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use std::sync::Arc;
use tgcollect_common::{
    client::MessagingClient,
    collector::collect_comments,
    model::{
        collect::{CollectRequest, CollectResponse},
        post::PostReference,
    },
};

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_post(collect_answers)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/collect", rejection(crate::server::ServerError))]
struct CollectPath();

#[axum::debug_handler(state = crate::server::ServerState)]
async fn collect_answers(
    CollectPath(): CollectPath,
    State(client): State<Arc<dyn MessagingClient>>,
    Json(request): Json<CollectRequest>,
) -> Result<Json<CollectResponse>> {
    let post = PostReference::parse(&request.post_url)?;
    let answers = collect_comments(client.as_ref(), post.channel, post.post_id).await?;

    Ok(Json(CollectResponse { answers }))
}
