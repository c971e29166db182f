//! HTTP surface: thin actix handlers that authenticate the caller and
//! delegate to the engines. Status codes fall out of `ServiceError`'s
//! `ResponseError` impl.

use std::sync::Arc;

use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::errors::Result;
use crate::schemas::{
    FriendRequestBody, Id, NewBill, OauthBody, RespondBody, SignInBody, SignUpBody,
};
use crate::store::Store;
use crate::{account, auth, bill, friendship, search};

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub secret: String,
}

#[post("/sign-up")]
async fn sign_up(state: web::Data<AppState>, body: web::Json<SignUpBody>) -> Result<HttpResponse> {
    let profile = account::sign_up(state.store.as_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}

#[post("/sign-in")]
async fn sign_in(state: web::Data<AppState>, body: web::Json<SignInBody>) -> Result<HttpResponse> {
    let reply = account::sign_in(state.store.as_ref(), &state.secret, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reply))
}

#[post("/sign-oauth")]
async fn sign_oauth(state: web::Data<AppState>, body: web::Json<OauthBody>) -> Result<HttpResponse> {
    let reply =
        account::oauth_login(state.store.as_ref(), &state.secret, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reply))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    email: String,
}

#[get("/search")]
async fn search_user(
    request: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    auth::authenticate(&request, state.store.as_ref()).await?;
    let profiles = search::find_by_email(state.store.as_ref(), &query.email).await?;
    Ok(HttpResponse::Ok().json(profiles))
}

#[post("/friend/send")]
async fn send_friend_request(
    request: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<FriendRequestBody>,
) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    let id = friendship::send_request(state.store.as_ref(), user_id, body.friend_id).await?;
    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

#[get("/friend/received")]
async fn received_friend_requests(
    request: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    let entries = friendship::received_pending(state.store.as_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[get("/friend/sent")]
async fn sent_friend_requests(
    request: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    let entries = friendship::sent_pending(state.store.as_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[put("/friend/respond")]
async fn respond_friend_request(
    request: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<RespondBody>,
) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    let updated = friendship::respond(
        state.store.as_ref(),
        user_id,
        body.friend_request_id,
        body.request_status,
    )
    .await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/friend/{friendRequestId}")]
async fn delete_friend_request(
    request: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    friendship::revoke(state.store.as_ref(), user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

#[get("/friend/list")]
async fn friends_list(request: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    let entries = friendship::friends(state.store.as_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[post("/bill")]
async fn create_bill(
    request: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NewBill>,
) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    let created = bill::create_bill(state.store.as_ref(), user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/bill")]
async fn list_bills(request: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    let list = bill::summaries(state.store.as_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(list))
}

#[get("/bill/{billId}")]
async fn bill_detail(
    request: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    let view = bill::detail(state.store.as_ref(), user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[delete("/bill/{billId}")]
async fn delete_bill(
    request: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    bill::delete(state.store.as_ref(), user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

#[put("/bill/{billId}/pay")]
async fn pay_bill(
    request: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    let share = bill::mark_paid(state.store.as_ref(), user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(share))
}

#[get("/category")]
async fn list_categories(
    request: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    auth::authenticate(&request, state.store.as_ref()).await?;
    let list = bill::categories(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(list))
}

#[get("/resume")]
async fn resume(request: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let user_id = auth::authenticate(&request, state.store.as_ref()).await?;
    let report = bill::resume(state.store.as_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(report))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(sign_up)
        .service(sign_in)
        .service(sign_oauth)
        .service(search_user)
        .service(send_friend_request)
        .service(received_friend_requests)
        .service(sent_friend_requests)
        .service(respond_friend_request)
        .service(friends_list)
        .service(delete_friend_request)
        .service(create_bill)
        .service(list_bills)
        .service(bill_detail)
        .service(delete_bill)
        .service(pay_bill)
        .service(list_categories)
        .service(resume);
}
